use rand::rngs::SmallRng;
use rand::Rng;

use crate::basic_types::ValueSet;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::VariableId;
use crate::warren_assert_simple;

/// Read access to the current assignment plus the solver's random generator, handed to
/// heuristics when they are asked for a decision.
pub(crate) struct SelectionContext<'a> {
    store: &'a VariableStore,
    random: &'a mut SmallRng,
}

impl<'a> SelectionContext<'a> {
    pub(crate) fn new(store: &'a VariableStore, random: &'a mut SmallRng) -> SelectionContext<'a> {
        SelectionContext { store, random }
    }

    pub(crate) fn store(&self) -> &VariableStore {
        self.store
    }

    pub(crate) fn is_solved(&self, variable: VariableId) -> bool {
        self.store.is_solved(variable)
    }

    /// Pick a value for a chosen variable: the value it was last solved to if still possible
    /// (phase saving), otherwise a uniformly random possible value.
    pub(crate) fn choose_value(&mut self, variable: VariableId) -> ValueSet {
        let potentials = self.store.potential_values(variable);

        let index = match self.store.last_solved_index(variable) {
            Some(saved) if potentials.contains(saved) => saved,
            _ => {
                let num_possible = potentials.count();
                warren_assert_simple!(num_possible > 0);
                let skip = self.random.gen_range(0..num_possible);
                potentials
                    .iter_set()
                    .nth(skip)
                    .expect("the random index is within the set-bit count")
            }
        };

        ValueSet::singleton(potentials.len(), index)
    }
}

use crate::basic_types::ValueSet;
use crate::branching::DecisionHeuristic;
use crate::branching::SelectionContext;
use crate::engine::variables::VariableId;

/// Picks the lowest-indexed unsolved variable and its smallest remaining value. Useful for
/// reproducible debugging runs.
#[derive(Debug, Default)]
pub(crate) struct StaticOrderHeuristic;

impl DecisionHeuristic for StaticOrderHeuristic {
    fn next_decision(
        &mut self,
        context: &mut SelectionContext<'_>,
    ) -> Option<(VariableId, ValueSet)> {
        let store = context.store();
        for variable in store.variables() {
            let potentials = store.potential_values(variable);
            if !potentials.is_singleton() {
                let index = potentials.first_set().expect("domains are never empty");
                return Some((variable, ValueSet::singleton(potentials.len(), index)));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::basic_types::ConstraintReference;
    use crate::engine::variable_store::VariableStore;
    use crate::engine::variables::VariableDomain;

    #[test]
    fn picks_first_unsolved_variable_and_smallest_value() {
        let mut store = VariableStore::new();
        let a = store
            .new_variable("a".to_owned(), VariableDomain::new(0, 2), None)
            .unwrap();
        let b = store
            .new_variable("b".to_owned(), VariableDomain::new(0, 2), None)
            .unwrap();

        let _ = store
            .constrain(a, &ValueSet::singleton(3, 1), ConstraintReference::decision())
            .unwrap();
        let _ = store
            .constrain(b, &ValueSet::from_indices(3, [1, 2]), ConstraintReference::decision())
            .unwrap();

        let mut random = SmallRng::seed_from_u64(0);
        let mut context = SelectionContext::new(&store, &mut random);
        let (chosen, values) = StaticOrderHeuristic.next_decision(&mut context).unwrap();
        assert_eq!(chosen, b);
        assert_eq!(values.singleton_index(), 1);
    }
}

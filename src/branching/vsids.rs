//! Variable State Independent Decaying Sum. Activity is bumped for every variable in a learned
//! clause; the bump amount grows geometrically, which is equivalent to decaying all other
//! activities. Everything is rescaled when activities threaten to overflow.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::basic_types::ValueSet;
use crate::branching::DecisionHeuristic;
use crate::branching::SelectionContext;
use crate::containers::KeyValueHeap;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::VariableId;

const INITIAL_ACTIVITY_RANGE: f64 = 1.0;
const MAX_ACTIVITY: f64 = 1e100;
const ACTIVITY_RESCALE: f64 = 1e-100;
const INITIAL_DECAY_AMOUNT: f64 = 1.0 / 0.85;
const MAX_DECAY_AMOUNT: f64 = 1.0 / 0.999;
const DECAY_STEP: f64 = 0.01;
const DECAY_UPDATE_FREQUENCY: u64 = 5000;

pub(crate) struct VsidsHeuristic {
    heap: KeyValueHeap,
    increment: f64,
    decay: f64,
    num_conflicts: u64,
}

impl VsidsHeuristic {
    pub(crate) fn new() -> VsidsHeuristic {
        VsidsHeuristic {
            heap: KeyValueHeap::new(0),
            increment: 1.0,
            decay: INITIAL_DECAY_AMOUNT,
            num_conflicts: 0,
        }
    }
}

impl DecisionHeuristic for VsidsHeuristic {
    fn initialise(&mut self, store: &VariableStore, random: &mut SmallRng) {
        self.heap = KeyValueHeap::new(store.num_variables());
        for variable in store.variables() {
            if !store.is_solved(variable) {
                self.heap
                    .set_priority(variable.raw(), random.gen_range(0.0..INITIAL_ACTIVITY_RANGE));
                self.heap.insert(variable.raw());
            }
        }
    }

    fn next_decision(
        &mut self,
        context: &mut SelectionContext<'_>,
    ) -> Option<(VariableId, ValueSet)> {
        loop {
            let top = self.heap.peek()?;
            let variable = VariableId::new(top);
            if context.is_solved(variable) {
                // Solved away by propagation; drop it lazily.
                self.heap.remove(top);
                continue;
            }
            let values = context.choose_value(variable);
            return Some((variable, values));
        }
    }

    fn on_assigned(&mut self, variable: VariableId, previous: &ValueSet, new: &ValueSet) {
        if new.is_singleton() && !previous.is_singleton() {
            self.heap.remove(variable.raw());
        }
    }

    fn on_unassigned(&mut self, variable: VariableId, before: &ValueSet, _after: &ValueSet) {
        if before.is_singleton() {
            self.heap.insert(variable.raw());
        }
    }

    fn on_conflict_participation(&mut self, variable: VariableId) {
        let bumped = self.heap.priority(variable.raw()) + self.increment;
        self.heap.set_priority(variable.raw(), bumped);
        if bumped > MAX_ACTIVITY {
            self.heap.scale_all(ACTIVITY_RESCALE);
            self.increment *= ACTIVITY_RESCALE;
        }
    }

    fn on_clause_learned(&mut self) {
        self.num_conflicts += 1;
        self.increment *= self.decay;
        if self.num_conflicts % DECAY_UPDATE_FREQUENCY == 0 {
            self.decay = MAX_DECAY_AMOUNT.max(self.decay - DECAY_STEP);
        }
    }
}

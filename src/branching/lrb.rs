//! Learning-Rate Branching: a variable's priority is an exponential moving average of how
//! often it participated in conflicts while it was assigned. Priorities age with a recency
//! decay applied lazily when the top of the heap is inspected.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::basic_types::ValueSet;
use crate::branching::DecisionHeuristic;
use crate::branching::SelectionContext;
use crate::containers::KeyValueHeap;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::VariableId;

const MIN_STEP_SIZE: f64 = 0.06;
const STEP_DECAY_SIZE: f64 = 1e-5;
const RECENCY_DECAY: f64 = 0.99;
const EMA_SEED_RANGE: f64 = 0.75;

pub(crate) struct LrbHeuristic {
    heap: KeyValueHeap,
    /// Conflict count at the variable's last assignment.
    assigned_at: Vec<u64>,
    /// Conflict count at the variable's last un-assignment or priority refresh.
    unassigned_at: Vec<u64>,
    /// Conflicts this variable's learned clauses contained it in, since assignment.
    participated: Vec<u64>,
    /// Conflicts where the variable sat on the reason side, since assignment.
    reasoned: Vec<u64>,
    step_size: f64,
    learnt_counter: u64,
}

impl LrbHeuristic {
    pub(crate) fn new() -> LrbHeuristic {
        LrbHeuristic {
            heap: KeyValueHeap::new(0),
            assigned_at: Vec::new(),
            unassigned_at: Vec::new(),
            participated: Vec::new(),
            reasoned: Vec::new(),
            step_size: 0.4,
            learnt_counter: 0,
        }
    }
}

impl DecisionHeuristic for LrbHeuristic {
    fn initialise(&mut self, store: &VariableStore, random: &mut SmallRng) {
        let num_variables = store.num_variables();
        self.heap = KeyValueHeap::new(num_variables);
        self.assigned_at = vec![0; num_variables];
        self.unassigned_at = vec![0; num_variables];
        self.participated = vec![0; num_variables];
        self.reasoned = vec![0; num_variables];

        for variable in store.variables() {
            if !store.is_solved(variable) {
                // Random seeds so the run seed matters; the moving average takes over with
                // time.
                self.heap
                    .set_priority(variable.raw(), random.gen_range(0.0..EMA_SEED_RANGE));
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

            // Lazily age the candidate before trusting its priority; a stale entry sinks and a
            // fresher one surfaces.
            let age = self.learnt_counter - self.unassigned_at[top as usize];
            if age > 0 {
                let decayed = self.heap.priority(top) * RECENCY_DECAY.powi(age as i32);
                self.heap.set_priority(top, decayed);
                self.unassigned_at[top as usize] = self.learnt_counter;
                continue;
            }

            let variable = VariableId::new(top);
            if context.is_solved(variable) {
                self.heap.remove(top);
                continue;
            }
            let values = context.choose_value(variable);
            return Some((variable, values));
        }
    }

    fn on_assigned(&mut self, variable: VariableId, previous: &ValueSet, new: &ValueSet) {
        if new.is_singleton() && !previous.is_singleton() {
            let index = variable.index();
            self.assigned_at[index] = self.learnt_counter;
            self.participated[index] = 0;
            self.reasoned[index] = 0;
            self.heap.remove(variable.raw());
        }
    }

    fn on_unassigned(&mut self, variable: VariableId, before: &ValueSet, _after: &ValueSet) {
        if before.is_singleton() {
            let index = variable.index();
            if !self.heap.contains(variable.raw()) {
                let interval = self.learnt_counter - self.assigned_at[index];
                if interval > 0 {
                    let learning_rate = self.participated[index] as f64 / interval as f64;
                    let reason_rate = self.reasoned[index] as f64 / interval as f64;
                    let updated = (1.0 - self.step_size) * self.heap.priority(variable.raw())
                        + self.step_size * (learning_rate + reason_rate);
                    self.heap.set_priority(variable.raw(), updated);
                }
                self.heap.insert(variable.raw());
            }
            self.unassigned_at[index] = self.learnt_counter;
        }
    }

    fn on_conflict_participation(&mut self, variable: VariableId) {
        self.participated[variable.index()] += 1;
    }

    fn on_reason_participation(&mut self, variable: VariableId) {
        self.reasoned[variable.index()] += 1;
    }

    fn on_clause_learned(&mut self) {
        self.learnt_counter += 1;
        self.step_size = MIN_STEP_SIZE.max(self.step_size - STEP_DECAY_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::engine::variables::VariableDomain;

    #[test]
    fn participation_raises_priority_on_unassignment() {
        let mut store = VariableStore::new();
        let a = store
            .new_variable("a".to_owned(), VariableDomain::boolean(), None)
            .unwrap();
        let b = store
            .new_variable("b".to_owned(), VariableDomain::boolean(), None)
            .unwrap();

        let mut random = SmallRng::seed_from_u64(3);
        let mut heuristic = LrbHeuristic::new();
        heuristic.initialise(&store, &mut random);

        // Flatten the random seeds so the moving average decides.
        heuristic.heap.set_priority(a.raw(), 0.0);
        heuristic.heap.set_priority(b.raw(), 0.0);

        let full = ValueSet::new_full(2);
        let solved = ValueSet::singleton(2, 1);

        // `a` is assigned, participates in two conflicts, and is unassigned again.
        heuristic.on_assigned(a, &full, &solved);
        heuristic.on_conflict_participation(a);
        heuristic.on_clause_learned();
        heuristic.on_conflict_participation(a);
        heuristic.on_clause_learned();
        heuristic.on_unassigned(a, &solved, &full);

        let mut context = SelectionContext::new(&store, &mut random);
        let (chosen, _) = heuristic.next_decision(&mut context).unwrap();
        assert_eq!(chosen, a);
    }
}

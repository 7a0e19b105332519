#![cfg(test)]
//! A miniature solver harness for unit-testing propagators: set up variables, post a
//! propagator, narrow domains by hand, and run the notification/propagation loop.

use crate::basic_types::Clause;
use crate::basic_types::ConstraintReference;
use crate::basic_types::Inconsistency;
use crate::basic_types::ValueSet;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::propagator_queue::PropagatorQueue;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableDomain;
use crate::engine::variables::VariableId;
use crate::engine::watch_list::WatchList;

pub(crate) struct TestSolver {
    pub(crate) store: VariableStore,
    watch_list: WatchList,
    queue: PropagatorQueue,
    propagators: Vec<Option<Box<dyn Propagator>>>,
    priorities: Vec<u32>,
    next_event: usize,
}

impl Default for TestSolver {
    fn default() -> TestSolver {
        TestSolver {
            store: VariableStore::new(),
            watch_list: WatchList::default(),
            queue: PropagatorQueue::new(5),
            propagators: Vec::new(),
            priorities: Vec::new(),
            next_event: 0,
        }
    }
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lower_bound: i32, upper_bound: i32) -> VariableId {
        let variable = self
            .store
            .new_variable(
                format!("x{}", self.store.num_variables()),
                VariableDomain::new(lower_bound, upper_bound),
                None,
            )
            .expect("test domains are non-empty");
        self.watch_list.grow_to(self.store.num_variables());
        variable
    }

    pub(crate) fn new_boolean(&mut self) -> VariableId {
        self.new_variable(0, 1)
    }

    pub(crate) fn true_literal(&self, variable: VariableId) -> Literal {
        Literal::new(variable, ValueSet::singleton(2, 1))
    }

    pub(crate) fn push_decision_level(&mut self) {
        self.store.push_decision_level();
    }

    /// Narrow a variable to the given domain values, as if by a decision.
    pub(crate) fn constrain_to_values(&mut self, variable: VariableId, values: &[i32]) {
        let domain = self.store.domain(variable);
        let mask = ValueSet::from_indices(
            domain.size(),
            values.iter().map(|&value| {
                domain
                    .value_to_index(value)
                    .expect("test values lie in the domain")
            }),
        );
        let changed = self
            .store
            .constrain(variable, &mask, ConstraintReference::decision())
            .expect("test narrowings are non-empty");
        assert!(changed, "the narrowing should change the domain");
    }

    pub(crate) fn assign_boolean(&mut self, variable: VariableId, value: bool) {
        self.constrain_to_values(variable, &[i32::from(value)]);
    }

    /// Post a propagator: initialise it, then propagate to a fixed point.
    pub(crate) fn new_propagator(
        &mut self,
        propagator: impl Propagator + 'static,
    ) -> Result<PropagatorId, Inconsistency> {
        let id = PropagatorId(self.propagators.len() as u32);
        let mut boxed: Box<dyn Propagator> = Box::new(propagator);

        let mut context =
            PropagatorInitialisationContext::new(&self.store, &mut self.watch_list, id);
        boxed.initialise_at_root(&mut context)?;

        self.priorities.push(boxed.priority());
        self.propagators.push(Some(boxed));
        self.queue.enqueue(id, self.priorities[id.index()]);
        self.notify_and_propagate()?;
        Ok(id)
    }

    /// The propagator slots, in the same shape the engine hands to conflict analysis.
    pub(crate) fn propagators(&self) -> &[Option<Box<dyn Propagator>>] {
        &self.propagators
    }

    /// The engine's propagation loop in miniature: fire watchers for queued narrowings in
    /// FIFO order, then drain the constraint queue.
    pub(crate) fn notify_and_propagate(&mut self) -> Result<(), Inconsistency> {
        loop {
            while self.next_event < self.store.num_trail_entries() {
                let event = self.next_event;
                self.next_event += 1;

                let entry = self.store.entry(event);
                let variable = entry.variable;
                let previous = entry.previous_values.clone();
                let new = entry.new_values.clone();

                let mut affected = Vec::new();
                self.watch_list
                    .affected_propagators(variable, &previous, &new, &mut affected);
                for id in affected {
                    let mut context = PropagationContextMut::new(
                        &mut self.store,
                        &mut self.watch_list,
                        &mut self.queue,
                        id,
                        self.priorities[id.index()],
                    );
                    self.propagators[id.index()]
                        .as_mut()
                        .expect("test propagators are never purged")
                        .on_narrowed(&mut context, variable, &previous)?;
                }
            }

            match self.queue.pop() {
                Some(id) => {
                    let mut context = PropagationContextMut::new(
                        &mut self.store,
                        &mut self.watch_list,
                        &mut self.queue,
                        id,
                        self.priorities[id.index()],
                    );
                    self.propagators[id.index()]
                        .as_mut()
                        .expect("test propagators are never purged")
                        .propagate(&mut context)?;
                }
                None => return Ok(()),
            }
        }
    }

    pub(crate) fn potential_indices(&self, variable: VariableId) -> Vec<usize> {
        self.store.potential_values(variable).iter_set().collect()
    }

    pub(crate) fn is_solved(&self, variable: VariableId) -> bool {
        self.store.is_solved(variable)
    }

    pub(crate) fn solved_index(&self, variable: VariableId) -> Option<usize> {
        self.store.solved_index(variable)
    }

    pub(crate) fn lower_bound(&self, variable: VariableId) -> i32 {
        let domain = self.store.domain(variable);
        domain.index_to_value(
            self.store
                .potential_values(variable)
                .first_set()
                .expect("domains are never empty"),
        )
    }

    pub(crate) fn upper_bound(&self, variable: VariableId) -> i32 {
        let domain = self.store.domain(variable);
        domain.index_to_value(
            self.store
                .potential_values(variable)
                .last_set()
                .expect("domains are never empty"),
        )
    }

    /// Ask the propagator that caused the most recent narrowing of `variable` to explain it.
    pub(crate) fn explain_last_narrowing_of(&self, variable: VariableId) -> Clause {
        let index = (0..self.store.num_trail_entries())
            .rev()
            .find(|&index| self.store.entry(index).variable == variable)
            .expect("the variable has been narrowed");
        let entry = self.store.entry(index);
        let id = entry
            .cause
            .as_propagator()
            .expect("the narrowing was caused by a propagator");
        let context = ExplanationContext::new(&self.store, index);
        self.propagators[id.index()]
            .as_ref()
            .expect("test propagators are never purged")
            .explain(&context, variable, &entry.new_values)
    }
}

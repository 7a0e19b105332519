use enumset::EnumSet;

use crate::basic_types::Clause;
use crate::basic_types::ConstraintReference;
use crate::basic_types::EmptyDomain;
use crate::basic_types::ValueSet;
use crate::engine::propagation::PropagatorId;
use crate::engine::propagator_queue::PropagatorQueue;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableDomain;
use crate::engine::variables::VariableId;
use crate::engine::watch_list::WatchEvent;
use crate::engine::watch_list::WatchList;
use crate::engine::watch_list::WatcherHandle;

/// Handed to [`Propagator::initialise_at_root`](crate::engine::propagation::Propagator); allows
/// registering watches and reading the root state.
pub(crate) struct PropagatorInitialisationContext<'a> {
    store: &'a VariableStore,
    watch_list: &'a mut WatchList,
    propagator: PropagatorId,
}

impl<'a> PropagatorInitialisationContext<'a> {
    pub(crate) fn new(
        store: &'a VariableStore,
        watch_list: &'a mut WatchList,
        propagator: PropagatorId,
    ) -> PropagatorInitialisationContext<'a> {
        PropagatorInitialisationContext {
            store,
            watch_list,
            propagator,
        }
    }

    pub(crate) fn register(
        &mut self,
        variable: VariableId,
        events: EnumSet<WatchEvent>,
    ) -> WatcherHandle {
        self.watch_list
            .add_watch(variable, events, None, self.propagator)
    }

    pub(crate) fn register_lost_values(
        &mut self,
        variable: VariableId,
        mask: ValueSet,
    ) -> WatcherHandle {
        self.watch_list.add_watch(
            variable,
            EnumSet::only(WatchEvent::LostValues),
            Some(mask),
            self.propagator,
        )
    }

    pub(crate) fn potential_values(&self, variable: VariableId) -> &ValueSet {
        self.store.potential_values(variable)
    }

    pub(crate) fn domain(&self, variable: VariableId) -> VariableDomain {
        self.store.domain(variable)
    }
}

/// Handed to propagation calls; the only way propagators narrow variables.
pub(crate) struct PropagationContextMut<'a> {
    store: &'a mut VariableStore,
    watch_list: &'a mut WatchList,
    queue: &'a mut PropagatorQueue,
    propagator: PropagatorId,
    priority: u32,
}

impl<'a> PropagationContextMut<'a> {
    pub(crate) fn new(
        store: &'a mut VariableStore,
        watch_list: &'a mut WatchList,
        queue: &'a mut PropagatorQueue,
        propagator: PropagatorId,
        priority: u32,
    ) -> PropagationContextMut<'a> {
        PropagationContextMut {
            store,
            watch_list,
            queue,
            propagator,
            priority,
        }
    }

    pub(crate) fn potential_values(&self, variable: VariableId) -> &ValueSet {
        self.store.potential_values(variable)
    }

    pub(crate) fn domain(&self, variable: VariableId) -> VariableDomain {
        self.store.domain(variable)
    }

    pub(crate) fn is_solved(&self, variable: VariableId) -> bool {
        self.store.is_solved(variable)
    }

    pub(crate) fn solved_index(&self, variable: VariableId) -> Option<usize> {
        self.store.solved_index(variable)
    }

    pub(crate) fn is_literal_true(&self, literal: &Literal) -> bool {
        self.store.is_literal_true(literal)
    }

    pub(crate) fn is_literal_false(&self, literal: &Literal) -> bool {
        self.store.is_literal_false(literal)
    }

    pub(crate) fn decision_level(&self) -> usize {
        self.store.decision_level()
    }

    /// Narrow `variable` to the intersection of its current values and `mask`.
    pub(crate) fn constrain(
        &mut self,
        variable: VariableId,
        mask: &ValueSet,
    ) -> Result<(), EmptyDomain> {
        let _ = self.store.constrain(
            variable,
            mask,
            ConstraintReference::constraint(self.propagator),
        )?;
        Ok(())
    }

    /// Remove every value in `mask` from `variable`.
    pub(crate) fn exclude(
        &mut self,
        variable: VariableId,
        mask: &ValueSet,
    ) -> Result<(), EmptyDomain> {
        let _ = self.store.exclude(
            variable,
            mask,
            ConstraintReference::constraint(self.propagator),
        )?;
        Ok(())
    }

    /// Force `literal` to hold.
    pub(crate) fn assert_literal(&mut self, literal: &Literal) -> Result<(), EmptyDomain> {
        self.constrain(literal.variable, &literal.values)
    }

    /// Stop receiving notifications through `handle` until the current decision level is
    /// unwound.
    pub(crate) fn disable_watcher_until_backtrack(&mut self, handle: WatcherHandle) {
        let level = self.store.decision_level();
        self.watch_list.disable_until_backtrack(handle, level);
    }

    /// Ask the solver to run [`Propagator::propagate`](super::Propagator) once the variable
    /// queue is drained.
    pub(crate) fn request_second_pass(&mut self) {
        self.queue.enqueue(self.propagator, self.priority);
    }
}

/// Read access to the trail state at the time of a narrowing, for producing explanations.
pub(crate) struct ExplanationContext<'a> {
    store: &'a VariableStore,
    /// The trail index of the narrowing being explained; reads see the state just before it.
    time: usize,
}

impl<'a> ExplanationContext<'a> {
    pub(crate) fn new(store: &'a VariableStore, time: usize) -> ExplanationContext<'a> {
        ExplanationContext { store, time }
    }

    /// The state of the solver at the current end of the trail; used for conflicts detected
    /// without a narrowing.
    pub(crate) fn at_current(store: &'a VariableStore) -> ExplanationContext<'a> {
        ExplanationContext {
            store,
            time: store.num_trail_entries(),
        }
    }

    pub(crate) fn values_before(&self, variable: VariableId) -> ValueSet {
        self.store.values_at(variable, self.time)
    }

    pub(crate) fn domain(&self, variable: VariableId) -> VariableDomain {
        self.store.domain(variable)
    }

    /// The generic reason usable by any propagator: "either `variable ∈ values`, or some other
    /// constrained variable regains one of the values it had lost by the time of the
    /// narrowing". Tighter explanations should be preferred where the propagator can produce
    /// them cheaply.
    pub(crate) fn generic_explanation(
        &self,
        scope: impl IntoIterator<Item = VariableId>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        let mut clause = Clause::default();
        clause.add(Literal::new(variable, values.clone()));
        for other in scope {
            if other == variable {
                continue;
            }
            let held = self.values_before(other);
            clause.add(Literal::new(other, held.inverted()));
        }
        clause
    }
}

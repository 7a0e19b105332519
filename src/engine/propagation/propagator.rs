use crate::basic_types::Clause;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::basic_types::ValueSet;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::VariableId;

/// The capability set every constraint implements. Propagators narrow variables through the
/// contexts they are handed; they never touch the trail directly.
///
/// The required methods are [`Propagator::name`], [`Propagator::initialise_at_root`],
/// [`Propagator::propagate`], [`Propagator::explain`] and [`Propagator::check_conflicting`].
/// [`Propagator::on_narrowed`] defaults to a full [`Propagator::propagate`] pass; incremental
/// propagators override it.
pub(crate) trait Propagator {
    /// The name of the propagator; used for logging.
    fn name(&self) -> &str;

    /// Position in the constraint queue: lower priorities are propagated first, so cheap
    /// propagators should report low values.
    fn priority(&self) -> u32 {
        1
    }

    /// Register watches and detect root-level inconsistency. Called exactly once, when solving
    /// starts. No propagation should happen here; the solver follows up with a
    /// [`Propagator::propagate`] call for the initial arc-consistency pass.
    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency>;

    /// Called through the watch system when a watched variable has been narrowed. `previous` is
    /// the value set from before the narrowing. May narrow further variables.
    fn on_narrowed(
        &mut self,
        context: &mut PropagationContextMut,
        _variable: VariableId,
        _previous: &ValueSet,
    ) -> PropagationStatus {
        self.propagate(context)
    }

    /// Propagate to a fixed point from the current state. Called for the initial pass and
    /// whenever the propagator asked for a second pass through
    /// [`PropagationContextMut::request_second_pass`].
    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus;

    /// Produce the reason for an earlier narrowing of `variable` to `values`: a clause
    /// containing the literal `(variable ∈ values)` whose remaining literals were all false at
    /// the time of the narrowing. Also used for the conflict clause itself, in which case
    /// `values` is the attempted (impossible) narrowing.
    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause;

    /// Whether the constraint is violated under the current (usually complete) assignment.
    /// Used to validate solutions.
    fn check_conflicting(&self, store: &VariableStore) -> bool;

    /// Invoked after a backjump for propagators that registered for backtrack notification.
    fn on_backjump(&mut self, _target_level: usize) {}

    /// Whether the solver should deliver [`Propagator::on_backjump`] calls.
    fn wants_backjump_notifications(&self) -> bool {
        false
    }
}

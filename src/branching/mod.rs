//! Decision heuristics. The solver keeps a stack of heuristics and queries them top-down on
//! every decision; the first one to return a `(variable, values)` pair wins. Every heuristic
//! receives callbacks for assignments, un-assignments, conflict participation, learned
//! clauses, and restarts.

mod log_replay;
mod lrb;
mod selection_context;
mod static_order;
mod vsids;

pub(crate) use log_replay::LogReplayHeuristic;
pub(crate) use lrb::LrbHeuristic;
pub(crate) use selection_context::SelectionContext;
pub(crate) use static_order::StaticOrderHeuristic;
pub(crate) use vsids::VsidsHeuristic;

use rand::rngs::SmallRng;

use crate::basic_types::ValueSet;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::VariableId;

pub(crate) trait DecisionHeuristic {
    /// Called once, after the build phase, before the first decision.
    fn initialise(&mut self, _store: &VariableStore, _random: &mut SmallRng) {}

    /// Produce the next decision, or `None` to defer to the next heuristic on the stack.
    fn next_decision(&mut self, context: &mut SelectionContext<'_>)
        -> Option<(VariableId, ValueSet)>;

    /// A variable was narrowed (not necessarily to a singleton).
    fn on_assigned(&mut self, _variable: VariableId, _previous: &ValueSet, _new: &ValueSet) {}

    /// A narrowing was undone by a backjump.
    fn on_unassigned(&mut self, _variable: VariableId, _before: &ValueSet, _after: &ValueSet) {}

    /// The variable appeared in the learned clause of a conflict.
    fn on_conflict_participation(&mut self, _variable: VariableId) {}

    /// The variable appeared on the reason side of a conflict resolution.
    fn on_reason_participation(&mut self, _variable: VariableId) {}

    fn on_clause_learned(&mut self) {}

    fn on_restart(&mut self) {}
}

use thiserror::Error;

use crate::basic_types::Clause;
use crate::basic_types::ValueSet;
use crate::engine::variables::VariableId;

/// The outcome of [`solve`](crate::ConstraintSolver::solve) or a single
/// [`step`](crate::ConstraintSolver::step).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveResult {
    /// Every variable is a singleton and no constraint is violated.
    Solved,
    /// A conflict was derived at decision level zero; no assignment exists.
    Unsatisfiable,
    /// The search has not finished yet; only returned from `step`.
    Unsolved,
}

/// The externally observable state of the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverStatus {
    #[default]
    Ready,
    Solving,
    Solved,
    Unsatisfiable,
}

/// Errors reported synchronously while building the problem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintOperationError {
    #[error("the solver is already in an infeasible state")]
    InfeasibleState,
    #[error("adding the constraint made the problem infeasible at the root")]
    InfeasibleConstraint,
    #[error("the initial values of a variable are contradictory (empty)")]
    EmptyInitialDomain,
    #[error("variables, constraints and rules can no longer be added once solving has started")]
    SolvingAlreadyStarted,
}

/// Returned by a narrowing that would leave `variable` without any possible value. `attempted`
/// is the value set the caller tried to narrow to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyDomain {
    pub variable: VariableId,
    pub attempted: ValueSet,
}

/// A propagator's way of reporting failure: either a narrowing emptied a domain, or the
/// propagator recognised the current state as inconsistent and explains why.
#[derive(Clone, Debug)]
pub enum Inconsistency {
    EmptyDomain(EmptyDomain),
    /// An explanation clause; every literal must be false under the current assignment.
    Conflict(Clause),
}

impl From<EmptyDomain> for Inconsistency {
    fn from(empty: EmptyDomain) -> Inconsistency {
        Inconsistency::EmptyDomain(empty)
    }
}

/// The result of running a propagator.
pub type PropagationStatus = Result<(), Inconsistency>;

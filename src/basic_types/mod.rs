mod clause;
mod constraint_reference;
mod moving_averages;
mod solution;
mod solve_result;
pub mod statistic_logging;
mod value_set;

pub use clause::Clause;
pub use constraint_reference::ConstraintReference;
pub(crate) use moving_averages::CumulativeMovingAverage;
pub(crate) use moving_averages::WindowedAverage;
pub use solution::Solution;
pub use solve_result::ConstraintOperationError;
pub use solve_result::EmptyDomain;
pub use solve_result::Inconsistency;
pub use solve_result::PropagationStatus;
pub use solve_result::SolveResult;
pub use solve_result::SolverStatus;
pub use value_set::ValueSet;

//! A finite-domain constraint solver with conflict-driven clause learning and an
//! answer-set-style rule layer.
//!
//! Problems are stated as variables over contiguous integer domains, constraints over those
//! variables, and optionally non-monotonic rule programs grounded over a
//! [topology](crate::topology::Topology). The engine searches by interleaving decisions with
//! watch-driven propagation; conflicts are analysed to the first unique implication point,
//! learned as clauses, and drive non-chronological backjumping and restarts.
//!
//! The entry point is [`ConstraintSolver`]:
//!
//! ```
//! use warren::ConstraintSolver;
//! use warren::SolveResult;
//! use warren::VariableDomain;
//!
//! let mut solver = ConstraintSolver::new("example", 0);
//! let x = solver.new_variable("x", VariableDomain::new(0, 3)).unwrap();
//! let y = solver.new_variable("y", VariableDomain::new(0, 3)).unwrap();
//! let _ = solver.add_all_different(vec![x, y]).unwrap();
//! let _ = solver.add_inequality(y, x, 1).unwrap(); // y + 1 <= x
//!
//! assert_eq!(solver.solve(), SolveResult::Solved);
//! assert!(solver.solved_value(x).unwrap() > solver.solved_value(y).unwrap());
//! ```

pub mod asserts;
pub mod basic_types;
mod branching;
mod containers;
mod engine;
mod program;
mod propagators;
pub mod restart;
mod rules;
mod statistics;
pub mod topology;

pub use basic_types::Clause;
pub use basic_types::ConstraintOperationError;
pub use basic_types::Solution;
pub use basic_types::SolveResult;
pub use basic_types::SolverStatus;
pub use basic_types::ValueSet;
pub use engine::decision_log::DecisionLogEntry;
pub use engine::decision_log::SolverDecisionLog;
pub use engine::propagation::PropagatorId;
pub use engine::variables::Literal;
pub use engine::variables::VariableDomain;
pub use engine::variables::VariableId;
pub use engine::ConstraintSolver;
pub use engine::DecisionStrategy;
pub use engine::SolverOptions;
pub use program::BinderFn;
pub use program::BodyElement;
pub use program::ExternalCall;
pub use program::ExternalHandle;
pub use program::ExternalPredicate;
pub use program::FormulaCall;
pub use program::FormulaHandle;
pub use program::FormulaId;
pub use program::Head;
pub use program::IdentifierId;
pub use program::ProgramError;
pub use program::ProgramSymbol;
pub use program::RuleProgram;
pub use program::Term;
pub use program::TopologyEdges;
pub use program::WildcardId;
pub use propagators::ValueBound;
pub use restart::RestartStrategy;
pub use rules::AbstractAtomId;
pub use rules::AbstractAtomRef;
pub use rules::AtomId;
pub use rules::AtomLiteral;
pub use rules::RuleDatabase;
pub use rules::TruthStatus;
pub use statistics::SolverStats;
pub use topology::GraphVariableRelation;

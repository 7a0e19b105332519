//! The rule-programming front-end: a builder DSL for rule statements over formulas,
//! wildcards, and topologies, and the grounder that turns programs into the propositional
//! rules of the [`RuleDatabase`](crate::rules::RuleDatabase).

mod ast;
mod compiler;
mod dsl;
mod externals;
mod instantiators;
mod symbols;

pub use ast::BodyElement;
pub use ast::ExternalCall;
pub use ast::FormulaCall;
pub use ast::FormulaId;
pub use ast::Head;
pub use ast::Term;
pub use ast::WildcardId;
pub(crate) use compiler::compile_program;
pub use dsl::BinderFn;
pub use dsl::ExternalHandle;
pub use dsl::FormulaHandle;
pub use dsl::ProgramError;
pub use dsl::RuleProgram;
pub use externals::ExternalPredicate;
pub use externals::TopologyEdges;
pub use symbols::IdentifierId;
pub use symbols::ProgramSymbol;

//! The rule layer: ground answer-set-style rules are collected in the [`RuleDatabase`], which
//! propagates facts, detects recursive loops through strongly-connected components, and emits
//! clause constraints (plus unfounded-set analyzers for non-tight programs) into the solver at
//! finalization.

mod rule_database;
mod unfounded_set_analyzer;

pub use rule_database::AbstractAtomId;
pub use rule_database::AbstractAtomRef;
pub use rule_database::AtomId;
pub use rule_database::AtomLiteral;
pub use rule_database::RuleDatabase;
pub use rule_database::TruthStatus;
pub(crate) use unfounded_set_analyzer::UnfoundedSetAnalyzer;

//! Counters describing a solve run, dumped through the statistic logger on request.

use std::time::Duration;

use crate::basic_types::statistic_logging::statistic_logger::log_statistic;
use crate::basic_types::CumulativeMovingAverage;

#[derive(Debug, Default, Clone, Copy)]
pub struct SolverStats {
    pub(crate) num_steps: u64,
    pub(crate) num_decisions: u64,
    pub(crate) num_conflicts: u64,
    pub(crate) num_restarts: u64,
    pub(crate) num_backjumps: u64,
    /// The largest number of levels undone by a single backjump.
    pub(crate) max_backjump: u64,
    pub(crate) num_learned_clauses: u64,
    pub(crate) num_learned_unit_clauses: u64,
    pub(crate) average_learned_clause_length: CumulativeMovingAverage,
    pub(crate) average_lbd: CumulativeMovingAverage,
    pub(crate) num_purged_clauses: u64,
    pub(crate) num_promoted_clauses: u64,
    pub(crate) num_propagations: u64,
    pub(crate) duration: Duration,
}

impl SolverStats {
    pub fn num_steps(&self) -> u64 {
        self.num_steps
    }

    pub fn num_decisions(&self) -> u64 {
        self.num_decisions
    }

    pub fn num_conflicts(&self) -> u64 {
        self.num_conflicts
    }

    pub fn num_restarts(&self) -> u64 {
        self.num_restarts
    }

    pub fn num_backjumps(&self) -> u64 {
        self.num_backjumps
    }

    pub fn max_backjump(&self) -> u64 {
        self.max_backjump
    }

    pub fn num_learned_clauses(&self) -> u64 {
        self.num_learned_clauses
    }

    pub fn num_learned_unit_clauses(&self) -> u64 {
        self.num_learned_unit_clauses
    }

    pub fn num_purged_clauses(&self) -> u64 {
        self.num_purged_clauses
    }

    pub fn num_promoted_clauses(&self) -> u64 {
        self.num_promoted_clauses
    }

    pub fn num_propagations(&self) -> u64 {
        self.num_propagations
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn log_statistics(&self) {
        log_statistic("numberOfSteps", self.num_steps);
        log_statistic("numberOfDecisions", self.num_decisions);
        log_statistic("numberOfConflicts", self.num_conflicts);
        log_statistic("numberOfRestarts", self.num_restarts);
        log_statistic("numberOfBackjumps", self.num_backjumps);
        log_statistic("maxBackjumpLength", self.max_backjump);
        log_statistic("numberOfLearnedClauses", self.num_learned_clauses);
        log_statistic("numberOfLearnedUnitClauses", self.num_learned_unit_clauses);
        log_statistic(
            "averageLearnedClauseLength",
            self.average_learned_clause_length.value(),
        );
        log_statistic("averageLbd", self.average_lbd.value());
        log_statistic("numberOfPurgedClauses", self.num_purged_clauses);
        log_statistic("numberOfPromotedClauses", self.num_promoted_clauses);
        log_statistic("numberOfPropagations", self.num_propagations);
        log_statistic("timeSpentInSolverInMilliseconds", self.duration.as_millis());
    }
}

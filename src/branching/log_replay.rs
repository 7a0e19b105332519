use log::warn;

use crate::basic_types::ValueSet;
use crate::branching::DecisionHeuristic;
use crate::branching::SelectionContext;
use crate::engine::decision_log::SolverDecisionLog;
use crate::engine::variables::VariableId;

/// Replays the decisions of a previous run. Entries whose variable is already solved are
/// skipped; entries whose value is no longer possible are skipped with a warning (the problem
/// differs from the recorded run). Once the log is exhausted the heuristic yields to the next
/// one on the stack.
pub(crate) struct LogReplayHeuristic {
    log: SolverDecisionLog,
    cursor: usize,
}

impl LogReplayHeuristic {
    pub(crate) fn new(log: SolverDecisionLog) -> LogReplayHeuristic {
        LogReplayHeuristic { log, cursor: 0 }
    }
}

impl DecisionHeuristic for LogReplayHeuristic {
    fn next_decision(
        &mut self,
        context: &mut SelectionContext<'_>,
    ) -> Option<(VariableId, ValueSet)> {
        while self.cursor < self.log.entries().len() {
            let entry = self.log.entries()[self.cursor];
            self.cursor += 1;

            let variable = VariableId::new(entry.variable_index);
            if variable.index() >= context.store().num_variables() {
                warn!(
                    "decision log refers to unknown variable {}; skipping",
                    entry.variable_index
                );
                continue;
            }

            let potentials = context.store().potential_values(variable);
            if potentials.is_singleton() {
                continue;
            }
            if !potentials.contains(entry.value_index) {
                warn!(
                    "logged value {} for {} is no longer possible; skipping",
                    entry.value_index,
                    context.store().name(variable)
                );
                continue;
            }
            return Some((
                variable,
                ValueSet::singleton(potentials.len(), entry.value_index),
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::basic_types::ConstraintReference;
    use crate::engine::variable_store::VariableStore;
    use crate::engine::variables::VariableDomain;

    #[test]
    fn replays_in_order_and_skips_solved() {
        let mut store = VariableStore::new();
        let a = store
            .new_variable("a".to_owned(), VariableDomain::new(0, 3), None)
            .unwrap();
        let b = store
            .new_variable("b".to_owned(), VariableDomain::new(0, 3), None)
            .unwrap();

        let mut log = SolverDecisionLog::default();
        log.add_decision(1, a.raw(), 2);
        log.add_decision(2, b.raw(), 1);

        // `a` is already solved consistently, so the replay starts at `b`.
        let _ = store
            .constrain(a, &ValueSet::singleton(4, 2), ConstraintReference::decision())
            .unwrap();

        let mut random = SmallRng::seed_from_u64(0);
        let mut heuristic = LogReplayHeuristic::new(log);
        let mut context = SelectionContext::new(&store, &mut random);

        let (variable, values) = heuristic.next_decision(&mut context).unwrap();
        assert_eq!(variable, b);
        assert_eq!(values.singleton_index(), 1);

        // Exhausted: defers to the next heuristic on the stack.
        assert!(heuristic.next_decision(&mut context).is_none());
    }
}

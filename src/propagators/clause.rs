use crate::basic_types::Clause;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::basic_types::ValueSet;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::VariableId;
use crate::engine::watch_list::WatcherHandle;

/// A disjunction of value-set literals. Watches every literal for becoming false; once a
/// single unfalse literal remains it is forced to hold. A satisfied clause disables its
/// watchers until the satisfying level is unwound.
///
/// Learned clauses are represented by this same propagator with `is_learned` set.
pub(crate) struct ClausePropagator {
    clause: Clause,
    is_learned: bool,
    handles: Vec<WatcherHandle>,
}

impl ClausePropagator {
    pub(crate) fn new(clause: Clause, is_learned: bool) -> ClausePropagator {
        ClausePropagator {
            clause,
            is_learned,
            handles: Vec::new(),
        }
    }

    fn disable_until_backtrack(&self, context: &mut PropagationContextMut) {
        for &handle in &self.handles {
            context.disable_watcher_until_backtrack(handle);
        }
    }
}

impl Propagator for ClausePropagator {
    fn name(&self) -> &str {
        if self.is_learned {
            "LearnedClause"
        } else {
            "Clause"
        }
    }

    fn priority(&self) -> u32 {
        0
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        if self.clause.is_empty() {
            return Err(Inconsistency::Conflict(Clause::default()));
        }
        for literal in self.clause.iter() {
            let handle = context.register_lost_values(literal.variable, literal.values.clone());
            self.handles.push(handle);
        }
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let mut unfalse = None;
        let mut num_unfalse = 0;

        for literal in self.clause.iter() {
            if context.is_literal_true(literal) {
                self.disable_until_backtrack(context);
                return Ok(());
            }
            if !context.is_literal_false(literal) {
                num_unfalse += 1;
                unfalse = Some(literal.clone());
            }
        }

        match num_unfalse {
            0 => Err(Inconsistency::Conflict(self.clause.clone())),
            1 => {
                let literal = unfalse.expect("a single unfalse literal remains");
                context.assert_literal(&literal)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn explain(
        &self,
        _context: &ExplanationContext<'_>,
        variable: VariableId,
        _values: &ValueSet,
    ) -> Clause {
        debug_assert!(
            self.clause.find(variable).is_some(),
            "asked to explain a variable outside the clause"
        );
        self.clause.clone()
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        self.clause.iter().all(|literal| store.is_literal_false(literal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    #[test]
    fn last_unfalse_literal_is_forced() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let clause = Clause::new(vec![solver.true_literal(a), solver.true_literal(b)]);
        let id = solver
            .new_propagator(ClausePropagator::new(clause, false))
            .expect("no root conflict");

        solver.push_decision_level();
        solver.assign_boolean(a, false);
        solver.notify_and_propagate().expect("no conflict");
        let _ = id;

        assert_eq!(solver.solved_index(b), Some(1));
    }

    #[test]
    fn all_false_is_a_conflict() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let clause = Clause::new(vec![solver.true_literal(a), solver.true_literal(b)]);
        let _ = solver
            .new_propagator(ClausePropagator::new(clause, false))
            .expect("no root conflict");

        solver.push_decision_level();
        solver.assign_boolean(a, false);
        solver.assign_boolean(b, false);
        let result = solver.notify_and_propagate();
        assert!(result.is_err());
    }

    #[test]
    fn satisfied_clause_does_nothing() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let clause = Clause::new(vec![solver.true_literal(a), solver.true_literal(b)]);
        let _ = solver
            .new_propagator(ClausePropagator::new(clause, false))
            .expect("no root conflict");

        solver.push_decision_level();
        solver.assign_boolean(a, true);
        solver.notify_and_propagate().expect("no conflict");

        assert!(!solver.is_solved(b));
    }
}

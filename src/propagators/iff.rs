use crate::basic_types::Clause;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::basic_types::ValueSet;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorInitialisationContext;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableId;

/// Two literals are equivalent: whenever one becomes true the other is forced true, and
/// whenever one becomes false the other is forced false.
pub(crate) struct IffPropagator {
    left: Literal,
    right: Literal,
}

impl IffPropagator {
    pub(crate) fn new(left: Literal, right: Literal) -> IffPropagator {
        IffPropagator { left, right }
    }

    fn truth(context: &PropagationContextMut<'_>, literal: &Literal) -> Option<bool> {
        if context.is_literal_true(literal) {
            Some(true)
        } else if context.is_literal_false(literal) {
            Some(false)
        } else {
            None
        }
    }
}

impl Propagator for IffPropagator {
    fn name(&self) -> &str {
        "Iff"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        // Wake on losing either phase of either side.
        let _ = context.register_lost_values(self.left.variable, self.left.values.clone());
        let _ =
            context.register_lost_values(self.left.variable, self.left.values.inverted());
        let _ = context.register_lost_values(self.right.variable, self.right.values.clone());
        let _ =
            context.register_lost_values(self.right.variable, self.right.values.inverted());
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let pairs = [
            (self.left.clone(), self.right.clone()),
            (self.right.clone(), self.left.clone()),
        ];
        for (determined, other) in pairs {
            match Self::truth(context, &determined) {
                Some(true) => context.assert_literal(&other)?,
                Some(false) => context.assert_literal(&other.negated())?,
                None => {}
            }
        }
        Ok(())
    }

    fn explain(
        &self,
        _context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        let (narrowed, other) = if variable == self.right.variable {
            (&self.right, &self.left)
        } else {
            (&self.left, &self.right)
        };

        // Which phase was propagated decides which implication is the reason.
        if values.is_subset_of(&narrowed.values) {
            // narrowed was forced true because other was true: (¬other ∨ narrowed).
            Clause::new(vec![other.negated(), narrowed.clone()])
        } else {
            // narrowed was forced false because other was false: (other ∨ ¬narrowed).
            Clause::new(vec![other.clone(), narrowed.negated()])
        }
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        let left_true = store.is_literal_true(&self.left);
        let left_false = store.is_literal_false(&self.left);
        let right_true = store.is_literal_true(&self.right);
        let right_false = store.is_literal_false(&self.right);
        (left_true && right_false) || (left_false && right_true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    #[test]
    fn truth_is_channelled_both_ways() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let _ = solver
            .new_propagator(IffPropagator::new(
                solver.true_literal(a),
                solver.true_literal(b),
            ))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(a, true);
        solver.notify_and_propagate().expect("no conflict");
        assert_eq!(solver.solved_index(b), Some(1));
    }

    #[test]
    fn falsity_is_channelled() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let _ = solver
            .new_propagator(IffPropagator::new(
                solver.true_literal(a),
                solver.true_literal(b),
            ))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(b, false);
        solver.notify_and_propagate().expect("no conflict");
        assert_eq!(solver.solved_index(a), Some(0));
    }

    #[test]
    fn opposed_assignments_conflict() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let _ = solver
            .new_propagator(IffPropagator::new(
                solver.true_literal(a),
                solver.true_literal(b),
            ))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(a, true);
        solver.assign_boolean(b, false);
        assert!(solver.notify_and_propagate().is_err());
    }
}

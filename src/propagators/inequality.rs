use enumset::EnumSet;

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
use crate::engine::watch_list::WatchEvent;

/// Enforces `left + offset <= right` with bounds reasoning.
pub(crate) struct InequalityPropagator {
    left: VariableId,
    right: VariableId,
    offset: i32,
}

impl InequalityPropagator {
    pub(crate) fn new(left: VariableId, right: VariableId, offset: i32) -> InequalityPropagator {
        InequalityPropagator {
            left,
            right,
            offset,
        }
    }
}

impl Propagator for InequalityPropagator {
    fn name(&self) -> &str {
        "Inequality"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        let _ = context.register(self.left, EnumSet::only(WatchEvent::BoundsChange));
        let _ = context.register(self.right, EnumSet::only(WatchEvent::BoundsChange));
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let left_domain = context.domain(self.left);
        let right_domain = context.domain(self.right);

        let left_min = left_domain.index_to_value(
            context
                .potential_values(self.left)
                .first_set()
                .expect("domains are never empty"),
        );
        let right_mask = right_domain.range_mask(left_min + self.offset, right_domain.max_value());
        context.constrain(self.right, &right_mask)?;

        let right_max = right_domain.index_to_value(
            context
                .potential_values(self.right)
                .last_set()
                .expect("domains are never empty"),
        );
        let left_mask = left_domain.range_mask(left_domain.min_value(), right_max - self.offset);
        context.constrain(self.left, &left_mask)?;
        Ok(())
    }

    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        context.generic_explanation([self.left, self.right], variable, values)
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        match (store.solved_value(self.left), store.solved_value(self.right)) {
            (Some(left), Some(right)) => left + self.offset > right,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    #[test]
    fn bounds_are_tightened() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 9);
        let y = solver.new_variable(0, 9);

        let _ = solver
            .new_propagator(InequalityPropagator::new(x, y, 3))
            .expect("feasible at root");

        // x + 3 <= y.
        assert_eq!(solver.lower_bound(y), 3);
        assert_eq!(solver.upper_bound(x), 6);

        solver.push_decision_level();
        solver.constrain_to_values(x, &[4, 5, 6]);
        solver.notify_and_propagate().expect("no conflict");
        assert_eq!(solver.lower_bound(y), 7);
    }

    #[test]
    fn violated_bounds_conflict() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(5, 9);
        let y = solver.new_variable(0, 4);
        assert!(solver
            .new_propagator(InequalityPropagator::new(x, y, 0))
            .is_err());
    }
}

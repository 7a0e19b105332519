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

/// Bounds-consistent `min_sum <= Σ variables <= max_sum`.
pub(crate) struct LinearSumPropagator {
    variables: Box<[VariableId]>,
    min_sum: i64,
    max_sum: i64,
}

impl LinearSumPropagator {
    pub(crate) fn new(
        variables: Box<[VariableId]>,
        min_sum: i64,
        max_sum: i64,
    ) -> LinearSumPropagator {
        assert!(min_sum <= max_sum);
        LinearSumPropagator {
            variables,
            min_sum,
            max_sum,
        }
    }

    fn bounds_of(context: &PropagationContextMut<'_>, variable: VariableId) -> (i64, i64) {
        let domain = context.domain(variable);
        let values = context.potential_values(variable);
        let low = domain.index_to_value(values.first_set().expect("domains are never empty"));
        let high = domain.index_to_value(values.last_set().expect("domains are never empty"));
        (i64::from(low), i64::from(high))
    }
}

impl Propagator for LinearSumPropagator {
    fn name(&self) -> &str {
        "LinearSum"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for &variable in self.variables.iter() {
            let _ = context.register(variable, EnumSet::only(WatchEvent::BoundsChange));
        }
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let bounds: Vec<(i64, i64)> = self
            .variables
            .iter()
            .map(|&variable| Self::bounds_of(context, variable))
            .collect();
        let total_low: i64 = bounds.iter().map(|&(low, _)| low).sum();
        let total_high: i64 = bounds.iter().map(|&(_, high)| high).sum();

        for (position, &variable) in self.variables.iter().enumerate() {
            let (low, high) = bounds[position];
            let others_low = total_low - low;
            let others_high = total_high - high;

            let allowed_high = self.max_sum - others_low;
            let allowed_low = self.min_sum - others_high;

            let domain = context.domain(variable);
            let clamp = |value: i64| value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            let mask = domain.range_mask(clamp(allowed_low), clamp(allowed_high));
            context.constrain(variable, &mask)?;
        }
        Ok(())
    }

    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        context.generic_explanation(self.variables.iter().copied(), variable, values)
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        let mut sum = 0i64;
        for &variable in self.variables.iter() {
            match store.solved_value(variable) {
                Some(value) => sum += i64::from(value),
                None => return false,
            }
        }
        sum < self.min_sum || sum > self.max_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    #[test]
    fn upper_bound_limits_each_variable() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 9);
        let y = solver.new_variable(0, 9);

        let _ = solver
            .new_propagator(LinearSumPropagator::new([x, y].into(), 0, 5))
            .expect("feasible at root");

        assert_eq!(solver.upper_bound(x), 5);

        solver.push_decision_level();
        solver.constrain_to_values(y, &[4, 5]);
        solver.notify_and_propagate().expect("no conflict");
        assert_eq!(solver.upper_bound(x), 1);
    }

    #[test]
    fn exact_sum_forces_the_remainder() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 3);
        let y = solver.new_variable(0, 3);

        let _ = solver
            .new_propagator(LinearSumPropagator::new([x, y].into(), 5, 5))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.constrain_to_values(x, &[3]);
        solver.notify_and_propagate().expect("no conflict");
        assert_eq!(solver.solved_index(y), Some(2));
    }

    #[test]
    fn infeasible_sum_conflicts() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 1);
        let y = solver.new_variable(0, 1);
        assert!(solver
            .new_propagator(LinearSumPropagator::new([x, y].into(), 5, 9))
            .is_err());
    }
}

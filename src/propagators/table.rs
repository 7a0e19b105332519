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

/// The variables must jointly take one of the allowed tuples. Propagation keeps, per variable,
/// only the values that appear in some tuple whose every entry is still possible.
pub(crate) struct TablePropagator {
    variables: Box<[VariableId]>,
    tuples: Vec<Vec<i32>>,
}

impl TablePropagator {
    pub(crate) fn new(variables: Box<[VariableId]>, tuples: Vec<Vec<i32>>) -> TablePropagator {
        assert!(
            tuples.iter().all(|tuple| tuple.len() == variables.len()),
            "every tuple must assign every variable"
        );
        TablePropagator { variables, tuples }
    }

    fn tuple_possible(
        &self,
        tuple: &[i32],
        possible: impl Fn(VariableId, i32) -> bool,
    ) -> bool {
        self.variables
            .iter()
            .zip(tuple.iter())
            .all(|(&variable, &value)| possible(variable, value))
    }
}

impl Propagator for TablePropagator {
    fn name(&self) -> &str {
        "Table"
    }

    fn priority(&self) -> u32 {
        2
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        for &variable in self.variables.iter() {
            let _ = context.register(variable, EnumSet::only(WatchEvent::AnyChange));
        }

        let alive = self.tuples.iter().any(|tuple| {
            self.tuple_possible(tuple, |variable, value| {
                context
                    .domain(variable)
                    .value_to_index(value)
                    .is_some_and(|index| context.potential_values(variable).contains(index))
            })
        });
        if alive {
            Ok(())
        } else {
            Err(Inconsistency::Conflict(Clause::default()))
        }
    }

    fn on_narrowed(
        &mut self,
        context: &mut PropagationContextMut,
        _variable: VariableId,
        _previous: &ValueSet,
    ) -> PropagationStatus {
        // Table filtering inspects every tuple; batch the work into one pass after the cheap
        // propagators have drained.
        context.request_second_pass();
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let mut supported: Vec<ValueSet> = self
            .variables
            .iter()
            .map(|&variable| ValueSet::new_empty(context.domain(variable).size()))
            .collect();

        for tuple in &self.tuples {
            let alive = self.tuple_possible(tuple, |variable, value| {
                context
                    .domain(variable)
                    .value_to_index(value)
                    .is_some_and(|index| context.potential_values(variable).contains(index))
            });
            if !alive {
                continue;
            }
            for (position, &value) in tuple.iter().enumerate() {
                let domain = context.domain(self.variables[position]);
                let index = domain
                    .value_to_index(value)
                    .expect("alive tuples only hold in-domain values");
                supported[position].set(index);
            }
        }

        for (position, mask) in supported.iter().enumerate() {
            context.constrain(self.variables[position], mask)?;
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
        if !self.variables.iter().all(|&variable| store.is_solved(variable)) {
            return false;
        }
        !self.tuples.iter().any(|tuple| {
            self.tuple_possible(tuple, |variable, value| {
                store.solved_value(variable) == Some(value)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    #[test]
    fn unsupported_values_are_removed() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 2);
        let y = solver.new_variable(0, 2);

        let tuples = vec![vec![0, 1], vec![1, 2], vec![2, 2]];
        let _ = solver
            .new_propagator(TablePropagator::new([x, y].into(), tuples))
            .expect("feasible at root");

        // y = 0 appears in no tuple.
        assert_eq!(solver.potential_indices(y), vec![1, 2]);

        solver.push_decision_level();
        solver.constrain_to_values(y, &[1]);
        solver.notify_and_propagate().expect("no conflict");
        assert_eq!(solver.potential_indices(x), vec![0]);
    }

    #[test]
    fn no_live_tuple_is_a_conflict() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 1);
        let y = solver.new_variable(0, 1);

        let tuples = vec![vec![0, 0], vec![1, 1]];
        let _ = solver
            .new_propagator(TablePropagator::new([x, y].into(), tuples))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.constrain_to_values(x, &[0]);
        solver.constrain_to_values(y, &[1]);
        assert!(solver.notify_and_propagate().is_err());
    }
}

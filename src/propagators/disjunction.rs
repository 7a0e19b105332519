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

/// A disjunction of conjunctions: at least one group of literals must hold in full. A group
/// dies when any of its literals becomes false; once a single group is left alive, all of its
/// literals are asserted.
pub(crate) struct DisjunctionPropagator {
    groups: Vec<Vec<Literal>>,
}

impl DisjunctionPropagator {
    pub(crate) fn new(groups: Vec<Vec<Literal>>) -> DisjunctionPropagator {
        DisjunctionPropagator { groups }
    }

    /// One false literal per dead group, judged against the state read through `read`.
    fn dead_group_witnesses(
        &self,
        alive: usize,
        read: impl Fn(VariableId) -> ValueSet,
    ) -> Vec<Literal> {
        let mut witnesses = Vec::new();
        for (position, group) in self.groups.iter().enumerate() {
            if position == alive {
                continue;
            }
            let witness = group
                .iter()
                .find(|literal| !read(literal.variable).intersects(&literal.values));
            if let Some(witness) = witness {
                witnesses.push(witness.clone());
            }
        }
        witnesses
    }
}

impl Propagator for DisjunctionPropagator {
    fn name(&self) -> &str {
        "Disjunction"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        if self.groups.is_empty() {
            return Err(Inconsistency::Conflict(Clause::default()));
        }
        for group in &self.groups {
            for literal in group {
                let _ = context.register_lost_values(literal.variable, literal.values.clone());
            }
        }
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let alive: Vec<usize> = (0..self.groups.len())
            .filter(|&position| {
                self.groups[position]
                    .iter()
                    .all(|literal| !context.is_literal_false(literal))
            })
            .collect();

        match alive.as_slice() {
            [] => {
                let witnesses = self.dead_group_witnesses(usize::MAX, |variable| {
                    context.potential_values(variable).clone()
                });
                Err(Inconsistency::Conflict(Clause::new(witnesses)))
            }
            [only] => {
                for literal in self.groups[*only].clone() {
                    context.assert_literal(&literal)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        // The narrowing asserted a literal of the last alive group; every other group had a
        // false literal at the time.
        let alive = self.groups.iter().position(|group| {
            group.iter().all(|literal| {
                context
                    .values_before(literal.variable)
                    .intersects(&literal.values)
            })
        });

        let mut clause = Clause::default();
        clause.add(Literal::new(variable, values.clone()));
        let witnesses = self.dead_group_witnesses(alive.unwrap_or(usize::MAX), |other| {
            context.values_before(other)
        });
        for witness in witnesses {
            clause.add(witness);
        }
        clause
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        !self.groups.iter().any(|group| {
            group
                .iter()
                .all(|literal| store.is_literal_true(literal))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    #[test]
    fn last_alive_group_is_asserted() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();
        let c = solver.new_boolean();

        let groups = vec![
            vec![solver.true_literal(a)],
            vec![solver.true_literal(b), solver.true_literal(c)],
        ];
        let _ = solver
            .new_propagator(DisjunctionPropagator::new(groups))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(a, false);
        solver.notify_and_propagate().expect("no conflict");

        assert_eq!(solver.solved_index(b), Some(1));
        assert_eq!(solver.solved_index(c), Some(1));
    }

    #[test]
    fn all_groups_dead_is_a_conflict() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();

        let groups = vec![vec![solver.true_literal(a)], vec![solver.true_literal(b)]];
        let _ = solver
            .new_propagator(DisjunctionPropagator::new(groups))
            .expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(a, false);
        solver.assign_boolean(b, false);
        assert!(solver.notify_and_propagate().is_err());
    }
}

//! Unfounded-set reasoning for non-tight programs. For each recursive strongly-connected
//! component, this propagator makes sure no atom is true on circular support alone: atoms
//! whose every viable support depends on other unjustified atoms of the component are forced
//! false, with the component-external bodies as the explanation.

use log::trace;

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

#[derive(Debug)]
pub(crate) struct SupportBody {
    /// The solver literal of the supporting body.
    pub(crate) literal: Literal,
    /// Indices (into the member list) of the body's positive literals that belong to the same
    /// component; the body only justifies its head once these are justified themselves.
    pub(crate) members_in_body: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct MemberAtom {
    pub(crate) name: String,
    pub(crate) literal: Literal,
    pub(crate) supports: Vec<SupportBody>,
}

#[derive(Debug)]
pub(crate) struct UnfoundedSetAnalyzer {
    members: Vec<MemberAtom>,
}

impl UnfoundedSetAnalyzer {
    pub(crate) fn new(members: Vec<MemberAtom>) -> UnfoundedSetAnalyzer {
        UnfoundedSetAnalyzer { members }
    }

    /// The least fixed point of "some viable support has all its in-component atoms
    /// justified". `body_viable` judges whether a support body can still be true.
    fn justified_members(&self, body_viable: impl Fn(&Literal) -> bool) -> Vec<bool> {
        let mut justified = vec![false; self.members.len()];
        loop {
            let mut changed = false;
            for (position, member) in self.members.iter().enumerate() {
                if justified[position] {
                    continue;
                }
                let supported = member.supports.iter().any(|support| {
                    body_viable(&support.literal)
                        && support
                            .members_in_body
                            .iter()
                            .all(|&inner| justified[inner])
                });
                if supported {
                    justified[position] = true;
                    changed = true;
                }
            }
            if !changed {
                return justified;
            }
        }
    }

    /// The loop clause for the unfounded set: one of its atoms stays false, or some body
    /// external to the set becomes true. All external bodies are false whenever the set is
    /// unfounded, so the clause is ready for conflict analysis.
    fn external_support_clause(&self, subject: usize, justified: &[bool]) -> Clause {
        let mut clause = Clause::default();
        clause.add(self.members[subject].literal.negated());
        for (position, member) in self.members.iter().enumerate() {
            if justified[position] {
                continue;
            }
            for support in &member.supports {
                let external = support
                    .members_in_body
                    .iter()
                    .all(|&inner| justified[inner]);
                if external {
                    clause.add(support.literal.clone());
                }
            }
        }
        clause
    }
}

impl Propagator for UnfoundedSetAnalyzer {
    fn name(&self) -> &str {
        "UnfoundedSet"
    }

    fn priority(&self) -> u32 {
        4
    }

    fn initialise_at_root(
        &mut self,
        context: &mut PropagatorInitialisationContext,
    ) -> Result<(), Inconsistency> {
        // Unfoundedness can only appear when a support body loses the ability to be true.
        for member in &self.members {
            for support in &member.supports {
                let _ = context
                    .register_lost_values(support.literal.variable, support.literal.values.clone());
            }
        }
        Ok(())
    }

    fn on_narrowed(
        &mut self,
        context: &mut PropagationContextMut,
        _variable: VariableId,
        _previous: &ValueSet,
    ) -> PropagationStatus {
        context.request_second_pass();
        Ok(())
    }

    fn propagate(&mut self, context: &mut PropagationContextMut) -> PropagationStatus {
        let justified =
            self.justified_members(|literal| !context.is_literal_false(literal));

        for position in 0..self.members.len() {
            if justified[position] {
                continue;
            }
            let literal = self.members[position].literal.clone();
            if context.is_literal_true(&literal) {
                return Err(Inconsistency::Conflict(
                    self.external_support_clause(position, &justified),
                ));
            }
            if !context.is_literal_false(&literal) {
                trace!("unfounded atom {} forced false", self.members[position].name);
                context.assert_literal(&literal.negated())?;
            }
        }
        Ok(())
    }

    fn explain(
        &self,
        context: &ExplanationContext<'_>,
        variable: VariableId,
        values: &ValueSet,
    ) -> Clause {
        let justified = self.justified_members(|literal| {
            context
                .values_before(literal.variable)
                .intersects(&literal.values)
        });
        let subject = self
            .members
            .iter()
            .position(|member| member.literal.variable == variable)
            .expect("explained variable belongs to this component");

        let mut clause = self.external_support_clause(subject, &justified);
        // The propagated literal itself; merging keeps the clause normalized.
        clause.add(Literal::new(variable, values.clone()));
        clause
    }

    fn check_conflicting(&self, store: &VariableStore) -> bool {
        let justified = self.justified_members(|literal| !store.is_literal_false(literal));
        self.members
            .iter()
            .enumerate()
            .any(|(position, member)| {
                !justified[position] && store.is_literal_true(&member.literal)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_helper::TestSolver;

    /// Two atoms supporting each other (`a :- b. b :- a.`) plus an external rule `a :- e`.
    fn mutual_support(solver: &mut TestSolver) -> (Vec<VariableId>, UnfoundedSetAnalyzer) {
        let a = solver.new_boolean();
        let b = solver.new_boolean();
        let e = solver.new_boolean();

        let members = vec![
            MemberAtom {
                name: "a".to_owned(),
                literal: solver.true_literal(a),
                supports: vec![
                    SupportBody {
                        // a :- b, the body literal being b itself.
                        literal: solver.true_literal(b),
                        members_in_body: vec![1],
                    },
                    SupportBody {
                        // a :- e, external to the component.
                        literal: solver.true_literal(e),
                        members_in_body: vec![],
                    },
                ],
            },
            MemberAtom {
                name: "b".to_owned(),
                literal: solver.true_literal(b),
                supports: vec![SupportBody {
                    // b :- a.
                    literal: solver.true_literal(a),
                    members_in_body: vec![0],
                }],
            },
        ];
        (vec![a, b, e], UnfoundedSetAnalyzer::new(members))
    }

    #[test]
    fn circular_support_is_falsified_once_external_support_dies() {
        let mut solver = TestSolver::default();
        let (variables, analyzer) = mutual_support(&mut solver);
        let _ = solver.new_propagator(analyzer).expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(variables[2], false);
        solver.notify_and_propagate().expect("no conflict");

        // With e false, neither a nor b has external support.
        assert_eq!(solver.solved_index(variables[0]), Some(0));
    }

    #[test]
    fn unfounded_true_atom_is_a_conflict() {
        let mut solver = TestSolver::default();
        let (variables, analyzer) = mutual_support(&mut solver);
        let _ = solver.new_propagator(analyzer).expect("feasible at root");

        solver.push_decision_level();
        solver.assign_boolean(variables[0], true);
        solver.assign_boolean(variables[2], false);
        assert!(solver.notify_and_propagate().is_err());
    }
}

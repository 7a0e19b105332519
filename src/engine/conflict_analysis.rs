//! First-UIP conflict analysis over value-set literals.
//!
//! The working clause keeps one literal per variable (same-variable literals merge by union).
//! Resolution walks the trail backwards: the most recently falsified literal of the conflict
//! level is replaced by the explanation of the narrowing that falsified it, intersecting the
//! pivot's value sets, until exactly one literal of the conflict level remains — the first
//! unique implication point.

use fnv::FnvHashMap;
use fnv::FnvHashSet;

use crate::basic_types::Clause;
use crate::basic_types::ValueSet;
use crate::engine::propagation::ExplanationContext;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::PropagatorId;
use crate::engine::variable_store::VariableStore;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableId;
use crate::warren_assert_moderate;
use crate::warren_assert_simple;

/// The outcome of analysing one conflict.
#[derive(Debug)]
pub(crate) struct ConflictAnalysisResult {
    /// The learned clause. Contains the asserting literal.
    pub(crate) learned_clause: Vec<Literal>,
    /// The unique implication point: the single learned literal falsified at the conflict
    /// level. Constraining its variable to its values after the backjump re-establishes
    /// propagation.
    pub(crate) asserting_literal: Literal,
    /// The second-highest decision level among the learned literals (0 for a unit clause).
    pub(crate) backjump_level: usize,
    /// Number of distinct decision levels among the learned literals.
    pub(crate) lbd: u32,
    /// Every variable that appeared in the working clause during analysis.
    pub(crate) participating_variables: Vec<VariableId>,
    /// Every variable that appeared on the reason side of a resolution.
    pub(crate) reason_variables: Vec<VariableId>,
    /// Learned-clause propagators whose explanations took part in a resolution; their
    /// activities should be bumped.
    pub(crate) resolved_constraints: Vec<PropagatorId>,
}

/// `None` means the conflict is rooted at decision level 0 and the problem is unsatisfiable.
pub(crate) fn analyse_conflict(
    store: &VariableStore,
    propagators: &[Option<Box<dyn Propagator>>],
    learned_constraints: &FnvHashSet<PropagatorId>,
    conflict: Clause,
) -> Option<ConflictAnalysisResult> {
    let mut analyser = Analyser {
        store,
        working: FnvHashMap::default(),
        participating: FnvHashSet::default(),
        reason_side: FnvHashSet::default(),
        resolved: Vec::new(),
    };

    for literal in conflict {
        analyser.merge(literal);
    }

    let conflict_level = loop {
        // Resolution can dissolve every literal of the current highest level, in which case
        // the conflict is rooted lower down and the walk continues there.
        let conflict_level = analyser.max_level()?;
        if conflict_level == 0 {
            return None;
        }
        if analyser.count_at_level(conflict_level) <= 1 {
            break conflict_level;
        }

        let (pivot, falsifier) = analyser.latest_falsified_at(conflict_level);
        let entry = store.entry(falsifier);
        warren_assert_simple!(
            !entry.cause.is_decision(),
            "a decision cannot falsify more than one clause literal"
        );
        let propagator_id = entry.cause.as_propagator().expect("cause is a constraint");
        let propagator = propagators[propagator_id.index()]
            .as_ref()
            .expect("a constraint justifying a trail entry is never purged");

        let context = ExplanationContext::new(store, falsifier);
        let reason = propagator.explain(&context, pivot, &entry.new_values);
        if learned_constraints.contains(&propagator_id) {
            analyser.resolved.push(propagator_id);
        }

        analyser.resolve(pivot, reason);
    };

    Some(analyser.into_result(conflict_level))
}

struct WorkingLiteral {
    values: ValueSet,
    /// Trail index of the narrowing that falsified this literal.
    falsifier: usize,
    level: usize,
}

struct Analyser<'a> {
    store: &'a VariableStore,
    working: FnvHashMap<VariableId, WorkingLiteral>,
    participating: FnvHashSet<VariableId>,
    reason_side: FnvHashSet<VariableId>,
    resolved: Vec<PropagatorId>,
}

impl Analyser<'_> {
    /// Merge a literal into the working clause, unioning with an existing literal over the same
    /// variable. Literals that were never satisfiable on this trail are dropped: the clause
    /// without them is entailed all the same.
    fn merge(&mut self, literal: Literal) {
        warren_assert_moderate!(
            self.store.is_literal_false(&literal),
            "clause literals must be false at the conflict"
        );
        let _ = self.participating.insert(literal.variable);

        let values = match self.working.remove(&literal.variable) {
            Some(existing) => existing.values.union(&literal.values),
            None => literal.values,
        };
        if let Some(falsifier) = self.store.falsifying_entry(literal.variable, &values) {
            let level = self.store.entry(falsifier).decision_level;
            let _ = self.working.insert(
                literal.variable,
                WorkingLiteral {
                    values,
                    falsifier,
                    level,
                },
            );
        }
    }

    fn resolve(&mut self, pivot: VariableId, reason: Clause) {
        let current = self
            .working
            .remove(&pivot)
            .expect("the pivot is in the working clause");

        for literal in reason {
            let _ = self.reason_side.insert(literal.variable);
            if literal.variable == pivot {
                // Resolution keeps the intersection of the two pivot value sets.
                let kept = current.values.intersection(&literal.values);
                if !kept.is_empty() {
                    self.merge(Literal::new(pivot, kept));
                }
            } else {
                self.merge(literal);
            }
        }
    }

    fn max_level(&self) -> Option<usize> {
        self.working.values().map(|literal| literal.level).max()
    }

    fn count_at_level(&self, level: usize) -> usize {
        self.working
            .values()
            .filter(|literal| literal.level == level)
            .count()
    }

    fn latest_falsified_at(&self, level: usize) -> (VariableId, usize) {
        self.working
            .iter()
            .filter(|(_, literal)| literal.level == level)
            .map(|(&variable, literal)| (variable, literal.falsifier))
            .max_by_key(|&(_, falsifier)| falsifier)
            .expect("at least one literal at the conflict level")
    }

    fn into_result(self, conflict_level: usize) -> ConflictAnalysisResult {
        let mut asserting = None;
        let mut backjump_level = 0;
        let mut levels = FnvHashSet::default();
        let mut learned_clause = Vec::with_capacity(self.working.len());

        for (&variable, literal) in &self.working {
            let _ = levels.insert(literal.level);
            if literal.level == conflict_level {
                warren_assert_simple!(asserting.is_none());
                asserting = Some(Literal::new(variable, literal.values.clone()));
            } else {
                backjump_level = backjump_level.max(literal.level);
            }
            learned_clause.push(Literal::new(variable, literal.values.clone()));
        }

        ConflictAnalysisResult {
            learned_clause,
            asserting_literal: asserting.expect("exactly one literal at the conflict level"),
            backjump_level,
            lbd: levels.len() as u32,
            participating_variables: self.participating.into_iter().collect(),
            reason_variables: self.reason_side.into_iter().collect(),
            resolved_constraints: self.resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Inconsistency;
    use crate::engine::test_helper::TestSolver;
    use crate::propagators::ClausePropagator;

    fn post_clause(solver: &mut TestSolver, literals: Vec<Literal>) {
        let _ = solver
            .new_propagator(ClausePropagator::new(Clause::new(literals), false))
            .expect("feasible at root");
    }

    fn conflict_clause(inconsistency: Inconsistency) -> Clause {
        match inconsistency {
            Inconsistency::Conflict(clause) => clause,
            Inconsistency::EmptyDomain(_) => panic!("clause conflicts carry their own clause"),
        }
    }

    #[test]
    fn resolution_walks_back_to_the_decision() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let b = solver.new_boolean();
        let c = solver.new_boolean();

        // a -> b, a -> c, and b and c cannot both hold: deciding a is a dead end.
        let implies_b = vec![solver.true_literal(a).negated(), solver.true_literal(b)];
        let implies_c = vec![solver.true_literal(a).negated(), solver.true_literal(c)];
        let not_both = vec![
            solver.true_literal(b).negated(),
            solver.true_literal(c).negated(),
        ];
        post_clause(&mut solver, implies_b);
        post_clause(&mut solver, implies_c);
        post_clause(&mut solver, not_both);

        solver.push_decision_level();
        solver.assign_boolean(a, true);
        let conflict = conflict_clause(solver.notify_and_propagate().unwrap_err());

        let result = analyse_conflict(
            &solver.store,
            solver.propagators(),
            &FnvHashSet::default(),
            conflict,
        )
        .expect("the conflict sits above the root");

        // Both implications resolve away; the decision itself is the first UIP, so the
        // learned clause is the unit ¬a asserted at the root.
        assert_eq!(result.learned_clause.len(), 1);
        assert_eq!(result.asserting_literal.variable, a);
        assert_eq!(result.asserting_literal.values, ValueSet::singleton(2, 0));
        assert_eq!(result.backjump_level, 0);
        assert_eq!(result.lbd, 1);
        for variable in [a, b, c] {
            assert!(result.participating_variables.contains(&variable));
        }
    }

    #[test]
    fn backjump_level_is_the_second_highest_literal_level() {
        let mut solver = TestSolver::default();
        let x = solver.new_boolean();
        let y = solver.new_boolean();
        let z = solver.new_boolean();

        // x and y together force z, but y forbids z.
        let forces_z = vec![
            solver.true_literal(x).negated(),
            solver.true_literal(y).negated(),
            solver.true_literal(z),
        ];
        let forbids_z = vec![
            solver.true_literal(y).negated(),
            solver.true_literal(z).negated(),
        ];
        post_clause(&mut solver, forces_z);
        post_clause(&mut solver, forbids_z);

        solver.push_decision_level();
        solver.assign_boolean(x, true);
        solver.notify_and_propagate().expect("x alone forces nothing");

        solver.push_decision_level();
        solver.assign_boolean(y, true);
        let conflict = conflict_clause(solver.notify_and_propagate().unwrap_err());

        let result = analyse_conflict(
            &solver.store,
            solver.propagators(),
            &FnvHashSet::default(),
            conflict,
        )
        .expect("the conflict sits above the root");

        // The first UIP is ¬y at level 2; ¬x from level 1 stays in the clause and sets the
        // backjump target.
        assert_eq!(result.learned_clause.len(), 2);
        assert_eq!(result.asserting_literal.variable, y);
        assert_eq!(result.asserting_literal.values, ValueSet::singleton(2, 0));
        assert_eq!(result.backjump_level, 1);
        assert_eq!(result.lbd, 2);
        let kept = result
            .learned_clause
            .iter()
            .find(|literal| literal.variable == x)
            .expect("the level-1 antecedent survives resolution");
        assert_eq!(kept.values, ValueSet::singleton(2, 0));
    }

    #[test]
    fn conflicts_rooted_at_level_zero_are_unsatisfiable() {
        let mut solver = TestSolver::default();
        let a = solver.new_boolean();
        let fact = vec![solver.true_literal(a)];
        post_clause(&mut solver, fact);

        // The opposite unit clause conflicts during its initial propagation at the root.
        let inconsistency = solver
            .new_propagator(ClausePropagator::new(
                Clause::new(vec![solver.true_literal(a).negated()]),
                false,
            ))
            .unwrap_err();
        let conflict = conflict_clause(inconsistency);

        assert!(analyse_conflict(
            &solver.store,
            solver.propagators(),
            &FnvHashSet::default(),
            conflict,
        )
        .is_none());
    }
}

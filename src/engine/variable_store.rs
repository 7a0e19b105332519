//! The variable database: every variable's domain and current value set, together with the
//! assignment trail. The trail is the sole source of truth for undo during a backjump and for
//! the timestamped reads used by lazy explanations.

use log::trace;

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::ConstraintReference;
use crate::basic_types::EmptyDomain;
use crate::basic_types::ValueSet;
use crate::engine::variables::Literal;
use crate::engine::variables::VariableDomain;
use crate::engine::variables::VariableId;
use crate::warren_assert_moderate;
use crate::warren_assert_simple;

/// A single narrowing recorded on the trail.
#[derive(Clone, Debug)]
pub(crate) struct TrailEntry {
    pub(crate) variable: VariableId,
    pub(crate) previous_values: ValueSet,
    pub(crate) new_values: ValueSet,
    pub(crate) cause: ConstraintReference,
    pub(crate) decision_level: usize,
    /// Index of the previous trail entry for the same variable, forming a per-variable chain
    /// that makes timestamped reads cheap.
    pub(crate) previous_entry_for_variable: Option<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct VariableStore {
    domains: Vec<VariableDomain>,
    names: Vec<String>,
    current: Vec<ValueSet>,
    /// Most recent trail entry per variable.
    latest_entry: Vec<Option<u32>>,
    /// The value index each variable was last solved to, kept across backtracking for phase
    /// saving.
    last_solved: Vec<Option<usize>>,
    trail: Vec<TrailEntry>,
    /// `level_starts[l]` is the trail index at which decision level `l` began.
    level_starts: Vec<usize>,
}

impl VariableStore {
    pub(crate) fn new() -> VariableStore {
        VariableStore {
            level_starts: vec![0],
            ..Default::default()
        }
    }

    pub(crate) fn new_variable(
        &mut self,
        name: String,
        domain: VariableDomain,
        initial: Option<ValueSet>,
    ) -> Result<VariableId, ConstraintOperationError> {
        let values = match initial {
            Some(values) => {
                warren_assert_simple!(values.len() == domain.size());
                if values.is_empty() {
                    return Err(ConstraintOperationError::EmptyInitialDomain);
                }
                values
            }
            None => ValueSet::new_full(domain.size()),
        };

        let id = VariableId::new(self.domains.len() as u32);
        self.domains.push(domain);
        self.names.push(name);
        self.current.push(values);
        self.latest_entry.push(None);
        self.last_solved.push(None);
        Ok(id)
    }

    pub(crate) fn num_variables(&self) -> usize {
        self.domains.len()
    }

    pub(crate) fn variables(&self) -> impl Iterator<Item = VariableId> {
        (0..self.domains.len() as u32).map(VariableId::new)
    }

    pub(crate) fn domain(&self, variable: VariableId) -> VariableDomain {
        self.domains[variable.index()]
    }

    pub(crate) fn name(&self, variable: VariableId) -> &str {
        &self.names[variable.index()]
    }

    pub(crate) fn potential_values(&self, variable: VariableId) -> &ValueSet {
        &self.current[variable.index()]
    }

    pub(crate) fn is_solved(&self, variable: VariableId) -> bool {
        self.current[variable.index()].is_singleton()
    }

    pub(crate) fn solved_index(&self, variable: VariableId) -> Option<usize> {
        let values = &self.current[variable.index()];
        values.is_singleton().then(|| values.singleton_index())
    }

    pub(crate) fn solved_value(&self, variable: VariableId) -> Option<i32> {
        self.solved_index(variable)
            .map(|index| self.domain(variable).index_to_value(index))
    }

    pub(crate) fn last_solved_index(&self, variable: VariableId) -> Option<usize> {
        self.last_solved[variable.index()]
    }

    pub(crate) fn all_solved(&self) -> bool {
        self.current.iter().all(ValueSet::is_singleton)
    }

    /// Whether `literal` cannot be satisfied under the current assignment.
    pub(crate) fn is_literal_false(&self, literal: &Literal) -> bool {
        !self.current[literal.variable.index()].intersects(&literal.values)
    }

    /// Whether `literal` holds under every remaining assignment of its variable.
    pub(crate) fn is_literal_true(&self, literal: &Literal) -> bool {
        self.current[literal.variable.index()].is_subset_of(&literal.values)
    }

    pub(crate) fn decision_level(&self) -> usize {
        self.level_starts.len() - 1
    }

    pub(crate) fn push_decision_level(&mut self) {
        self.level_starts.push(self.trail.len());
    }

    pub(crate) fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }

    pub(crate) fn entry(&self, index: usize) -> &TrailEntry {
        &self.trail[index]
    }

    /// Intersect the variable's current values with `mask`. Returns whether anything changed;
    /// an empty result leaves the store untouched and reports the failed attempt.
    pub(crate) fn constrain(
        &mut self,
        variable: VariableId,
        mask: &ValueSet,
        cause: ConstraintReference,
    ) -> Result<bool, EmptyDomain> {
        let current = &self.current[variable.index()];
        if current.is_subset_of(mask) {
            return Ok(false);
        }

        let new_values = current.intersection(mask);
        if new_values.is_empty() {
            return Err(EmptyDomain {
                variable,
                attempted: mask.clone(),
            });
        }

        trace!(
            "narrow {} {} -> {} (level {})",
            variable,
            current.to_bit_string(),
            new_values.to_bit_string(),
            self.decision_level(),
        );

        let entry = TrailEntry {
            variable,
            previous_values: current.clone(),
            new_values: new_values.clone(),
            cause,
            decision_level: self.decision_level(),
            previous_entry_for_variable: self.latest_entry[variable.index()],
        };
        self.latest_entry[variable.index()] = Some(self.trail.len() as u32);
        self.trail.push(entry);

        if new_values.is_singleton() {
            self.last_solved[variable.index()] = Some(new_values.singleton_index());
        }
        self.current[variable.index()] = new_values;
        Ok(true)
    }

    /// Remove every value in `mask` from the variable's current values.
    pub(crate) fn exclude(
        &mut self,
        variable: VariableId,
        mask: &ValueSet,
        cause: ConstraintReference,
    ) -> Result<bool, EmptyDomain> {
        self.constrain(variable, &mask.inverted(), cause)
    }

    /// The variable's value set as it was before trail entry `time` was applied.
    pub(crate) fn values_at(&self, variable: VariableId, time: usize) -> ValueSet {
        let mut chain = self.latest_entry[variable.index()];
        let mut earliest_after: Option<&TrailEntry> = None;
        while let Some(index) = chain {
            let entry = &self.trail[index as usize];
            if (index as usize) < time {
                return entry.new_values.clone();
            }
            earliest_after = Some(entry);
            chain = entry.previous_entry_for_variable;
        }
        match earliest_after {
            Some(entry) => entry.previous_values.clone(),
            None => self.current[variable.index()].clone(),
        }
    }

    /// The most recent trail entry that made `values` impossible for `variable`, or `None` if
    /// the values were never possible since the trail began.
    pub(crate) fn falsifying_entry(&self, variable: VariableId, values: &ValueSet) -> Option<usize> {
        warren_assert_moderate!(!self.current[variable.index()].intersects(values));
        let mut chain = self.latest_entry[variable.index()];
        while let Some(index) = chain {
            let entry = &self.trail[index as usize];
            warren_assert_moderate!(!entry.new_values.intersects(values));
            if entry.previous_values.intersects(values) {
                return Some(index as usize);
            }
            chain = entry.previous_entry_for_variable;
        }
        None
    }

    /// Undo every trail entry above `target_level`. The undone entries are returned in undo
    /// order (most recent first) so the caller can notify heuristics and watchers.
    pub(crate) fn backjump(&mut self, target_level: usize) -> Vec<TrailEntry> {
        warren_assert_simple!(target_level < self.decision_level());

        let keep = self.level_starts[target_level + 1];
        let mut undone = Vec::with_capacity(self.trail.len() - keep);
        while self.trail.len() > keep {
            let entry = self.trail.pop().expect("trail has entries above the target");
            self.current[entry.variable.index()] = entry.previous_values.clone();
            self.latest_entry[entry.variable.index()] = entry.previous_entry_for_variable;
            undone.push(entry);
        }
        self.level_starts.truncate(target_level + 1);
        undone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::propagation::PropagatorId;

    fn store_with_variable(size: usize) -> (VariableStore, VariableId) {
        let mut store = VariableStore::new();
        let variable = store
            .new_variable("x".to_owned(), VariableDomain::new(0, size as i32 - 1), None)
            .unwrap();
        (store, variable)
    }

    #[test]
    fn contradictory_initial_values_are_a_build_error() {
        let mut store = VariableStore::new();
        let result = store.new_variable(
            "x".to_owned(),
            VariableDomain::new(0, 3),
            Some(ValueSet::new_empty(4)),
        );
        assert_eq!(result, Err(ConstraintOperationError::EmptyInitialDomain));
    }

    #[test]
    fn constrain_records_trail_and_shrinks() {
        let (mut store, x) = store_with_variable(5);
        let cause = ConstraintReference::constraint(PropagatorId(0));

        let changed = store
            .constrain(x, &ValueSet::from_indices(5, [1, 2, 3]), cause)
            .unwrap();
        assert!(changed);
        assert_eq!(store.num_trail_entries(), 1);
        assert!(store.potential_values(x).is_subset_of(&store.entry(0).previous_values));

        // Narrowing to a superset is a no-op.
        let changed = store
            .constrain(x, &ValueSet::new_full(5), cause)
            .unwrap();
        assert!(!changed);
        assert_eq!(store.num_trail_entries(), 1);
    }

    #[test]
    fn emptying_narrowing_is_rejected_and_state_kept() {
        let (mut store, x) = store_with_variable(4);
        let cause = ConstraintReference::decision();
        let _ = store
            .constrain(x, &ValueSet::from_indices(4, [0, 1]), cause)
            .unwrap();

        let result = store.constrain(x, &ValueSet::from_indices(4, [2, 3]), cause);
        assert!(result.is_err());
        assert_eq!(store.potential_values(x).count(), 2);
    }

    #[test]
    fn backjump_restores_previous_values() {
        let (mut store, x) = store_with_variable(4);
        let cause = ConstraintReference::decision();

        store.push_decision_level();
        let _ = store
            .constrain(x, &ValueSet::from_indices(4, [0, 1]), cause)
            .unwrap();
        store.push_decision_level();
        let _ = store
            .constrain(x, &ValueSet::singleton(4, 0), cause)
            .unwrap();
        assert!(store.is_solved(x));

        let undone = store.backjump(1);
        assert_eq!(undone.len(), 1);
        assert_eq!(store.decision_level(), 1);
        assert_eq!(store.potential_values(x).count(), 2);

        // Phase saving remembers the solved value across the backjump.
        assert_eq!(store.last_solved_index(x), Some(0));
    }

    #[test]
    fn values_at_reads_historic_state() {
        let (mut store, x) = store_with_variable(4);
        let cause = ConstraintReference::decision();
        store.push_decision_level();
        let _ = store
            .constrain(x, &ValueSet::from_indices(4, [0, 1, 2]), cause)
            .unwrap();
        let _ = store
            .constrain(x, &ValueSet::from_indices(4, [0, 1]), cause)
            .unwrap();

        assert_eq!(store.values_at(x, 0).count(), 4);
        assert_eq!(store.values_at(x, 1).count(), 3);
        assert_eq!(store.values_at(x, 2).count(), 2);
    }

    #[test]
    fn falsifying_entry_finds_the_removing_narrowing() {
        let (mut store, x) = store_with_variable(4);
        let cause = ConstraintReference::decision();
        store.push_decision_level();
        let _ = store
            .constrain(x, &ValueSet::from_indices(4, [0, 1, 3]), cause)
            .unwrap();
        let _ = store
            .constrain(x, &ValueSet::from_indices(4, [0, 1]), cause)
            .unwrap();

        assert_eq!(store.falsifying_entry(x, &ValueSet::singleton(4, 3)), Some(1));
        assert_eq!(store.falsifying_entry(x, &ValueSet::singleton(4, 2)), Some(0));
    }
}

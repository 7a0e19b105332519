//! Bookkeeping for temporary learned clauses: activities, LBD, and the purge pass that throws
//! away the least useful half when the database grows past its threshold.

use fnv::FnvHashSet;

use crate::engine::propagation::PropagatorId;

const ACTIVITY_RESCALE_THRESHOLD: f64 = 1e20;
const ACTIVITY_RESCALE: f64 = 1e-20;
const ACTIVITY_DECAY: f64 = 1.0 / 0.999;

#[derive(Debug, Clone, Copy)]
struct LearnedClauseInfo {
    propagator: PropagatorId,
    activity: f64,
    lbd: u32,
}

/// Tracks the temporary learned clauses. Clause activity works like VSIDS variable activity:
/// a growing increment is added whenever a clause takes part in a conflict resolution, which
/// is equivalent to decaying every other clause's activity each conflict.
#[derive(Debug)]
pub(crate) struct LearnedClauseManager {
    clauses: Vec<LearnedClauseInfo>,
    ids: FnvHashSet<PropagatorId>,
    activity_increment: f64,
    /// Purge when the number of temporary clauses exceeds this.
    max_temporary_clauses: usize,
}

impl LearnedClauseManager {
    pub(crate) fn new(max_temporary_clauses: usize) -> LearnedClauseManager {
        LearnedClauseManager {
            clauses: Vec::new(),
            ids: FnvHashSet::default(),
            activity_increment: 1.0,
            max_temporary_clauses,
        }
    }

    pub(crate) fn register(&mut self, propagator: PropagatorId, lbd: u32) {
        self.clauses.push(LearnedClauseInfo {
            propagator,
            activity: self.activity_increment,
            lbd,
        });
        let _ = self.ids.insert(propagator);
    }

    /// The set used by conflict analysis to recognise learned-clause reasons.
    pub(crate) fn ids(&self) -> &FnvHashSet<PropagatorId> {
        &self.ids
    }

    pub(crate) fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Bump a clause that participated in a resolution.
    pub(crate) fn bump_activity(&mut self, propagator: PropagatorId) {
        let increment = self.activity_increment;
        let mut rescale = false;
        for info in self.clauses.iter_mut() {
            if info.propagator == propagator {
                info.activity += increment;
                rescale = info.activity > ACTIVITY_RESCALE_THRESHOLD;
                break;
            }
        }
        if rescale {
            for info in self.clauses.iter_mut() {
                info.activity *= ACTIVITY_RESCALE;
            }
            self.activity_increment *= ACTIVITY_RESCALE;
        }
    }

    /// Equivalent to decrementing every clause's score once per conflict.
    pub(crate) fn on_conflict(&mut self) {
        self.activity_increment *= ACTIVITY_DECAY;
    }

    pub(crate) fn should_purge(&self) -> bool {
        self.clauses.len() > self.max_temporary_clauses
    }

    /// Drop the lowest-scoring half of the temporary clauses, keeping clauses in `locked`
    /// (those currently justifying a trail entry). Returns the purged propagators.
    pub(crate) fn purge(&mut self, locked: &FnvHashSet<PropagatorId>) -> Vec<PropagatorId> {
        let mut order: Vec<usize> = (0..self.clauses.len()).collect();
        order.sort_by(|&a, &b| {
            let left = &self.clauses[a];
            let right = &self.clauses[b];
            left.activity
                .partial_cmp(&right.activity)
                .expect("activities are never NaN")
                .then(right.lbd.cmp(&left.lbd))
        });

        let target = self.clauses.len() / 2;
        let mut purged = Vec::with_capacity(target);
        let mut purged_positions = FnvHashSet::default();
        for &position in &order {
            if purged.len() == target {
                break;
            }
            let info = self.clauses[position];
            if locked.contains(&info.propagator) {
                continue;
            }
            purged.push(info.propagator);
            let _ = purged_positions.insert(position);
            let _ = self.ids.remove(&info.propagator);
        }

        let mut position = 0;
        self.clauses.retain(|_| {
            let keep = !purged_positions.contains(&position);
            position += 1;
            keep
        });
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_drops_low_activity_unlocked_clauses() {
        let mut manager = LearnedClauseManager::new(3);
        for id in 0..4 {
            manager.register(PropagatorId(id), 3);
        }
        assert!(manager.should_purge());

        // Clause 2 is the only one with any activity.
        manager.bump_activity(PropagatorId(2));

        let mut locked = FnvHashSet::default();
        let _ = locked.insert(PropagatorId(0));

        let purged = manager.purge(&locked);
        assert_eq!(purged.len(), 2);
        assert!(!purged.contains(&PropagatorId(0)), "locked clauses survive");
        assert!(!purged.contains(&PropagatorId(2)), "active clauses survive");
        assert_eq!(manager.num_clauses(), 2);
    }
}

//! Watchers subscribe a propagator to narrowings of a variable. For a single narrowing,
//! watchers fire in stable registration order; across narrowings the dispatch is FIFO over the
//! trail.

use enumset::EnumSet;
use enumset::EnumSetType;

use crate::basic_types::ValueSet;
use crate::engine::propagation::PropagatorId;
use crate::engine::variables::VariableId;
use crate::warren_assert_simple;

/// The conditions under which a watcher fires.
#[derive(EnumSetType, Debug)]
pub(crate) enum WatchEvent {
    /// Any narrowing of the value set.
    AnyChange,
    /// The value set's cardinality dropped to one.
    BecameSingleton,
    /// The watcher's mask no longer intersects the value set.
    LostValues,
    /// The smallest or largest possible value changed.
    BoundsChange,
}

/// Identifies a registered watcher. Watchers are never moved, so handles stay valid for the
/// lifetime of the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WatcherHandle {
    variable: VariableId,
    index: usize,
}

#[derive(Debug)]
struct Watcher {
    propagator: PropagatorId,
    events: EnumSet<WatchEvent>,
    /// Only consulted for [`WatchEvent::LostValues`].
    lost_mask: Option<ValueSet>,
    disabled: bool,
    /// Permanently disabled; set when the owning propagator is purged.
    dead: bool,
}

#[derive(Debug, Default)]
pub(crate) struct WatchList {
    watchers: Vec<Vec<Watcher>>,
    /// Watchers disabled until the given decision level is unwound, most recent last.
    disabled_until_backtrack: Vec<(usize, WatcherHandle)>,
}

impl WatchList {
    pub(crate) fn grow_to(&mut self, num_variables: usize) {
        while self.watchers.len() < num_variables {
            self.watchers.push(Vec::new());
        }
    }

    pub(crate) fn add_watch(
        &mut self,
        variable: VariableId,
        events: EnumSet<WatchEvent>,
        lost_mask: Option<ValueSet>,
        propagator: PropagatorId,
    ) -> WatcherHandle {
        warren_assert_simple!(
            events.contains(WatchEvent::LostValues) == lost_mask.is_some(),
            "a lost-values watch needs a mask, and only a lost-values watch takes one"
        );
        let list = &mut self.watchers[variable.index()];
        list.push(Watcher {
            propagator,
            events,
            lost_mask,
            disabled: false,
            dead: false,
        });
        WatcherHandle {
            variable,
            index: list.len() - 1,
        }
    }

    /// Disable a watcher until the search backtracks below `level`. A watcher disabled at the
    /// root stays disabled for the remainder of the search.
    pub(crate) fn disable_until_backtrack(&mut self, handle: WatcherHandle, level: usize) {
        let watcher = &mut self.watchers[handle.variable.index()][handle.index];
        if watcher.disabled || watcher.dead {
            return;
        }
        watcher.disabled = true;
        self.disabled_until_backtrack.push((level, handle));
    }

    /// Re-enable watchers whose disable level is being unwound.
    pub(crate) fn on_backjump(&mut self, target_level: usize) {
        while let Some(&(level, handle)) = self.disabled_until_backtrack.last() {
            if level <= target_level {
                break;
            }
            let _ = self.disabled_until_backtrack.pop();
            self.watchers[handle.variable.index()][handle.index].disabled = false;
        }
    }

    /// Permanently disable every watcher owned by `propagator`; used when a learned clause is
    /// purged.
    pub(crate) fn kill_propagator_watches(&mut self, propagator: PropagatorId) {
        for list in self.watchers.iter_mut() {
            for watcher in list.iter_mut() {
                if watcher.propagator == propagator {
                    watcher.dead = true;
                }
            }
        }
    }

    /// Collect the propagators whose watch conditions match a narrowing of `variable` from
    /// `previous` to `new`, in registration order.
    pub(crate) fn affected_propagators(
        &self,
        variable: VariableId,
        previous: &ValueSet,
        new: &ValueSet,
        output: &mut Vec<PropagatorId>,
    ) {
        output.clear();
        for watcher in &self.watchers[variable.index()] {
            if watcher.disabled || watcher.dead {
                continue;
            }
            if Self::fires(watcher, previous, new) {
                output.push(watcher.propagator);
            }
        }
    }

    fn fires(watcher: &Watcher, previous: &ValueSet, new: &ValueSet) -> bool {
        for event in watcher.events {
            let matched = match event {
                WatchEvent::AnyChange => true,
                WatchEvent::BecameSingleton => new.is_singleton() && !previous.is_singleton(),
                WatchEvent::LostValues => {
                    let mask = watcher
                        .lost_mask
                        .as_ref()
                        .expect("lost-values watches carry a mask");
                    previous.intersects(mask) && !new.intersects(mask)
                }
                WatchEvent::BoundsChange => {
                    previous.first_set() != new.first_set() || previous.last_set() != new.last_set()
                }
            };
            if matched {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use enumset::EnumSet;

    use super::*;

    fn narrowing(len: usize, prev: &[usize], new: &[usize]) -> (ValueSet, ValueSet) {
        (
            ValueSet::from_indices(len, prev.iter().copied()),
            ValueSet::from_indices(len, new.iter().copied()),
        )
    }

    #[test]
    fn watchers_fire_in_registration_order() {
        let mut list = WatchList::default();
        list.grow_to(1);
        let x = VariableId::new(0);
        let _ = list.add_watch(x, EnumSet::only(WatchEvent::AnyChange), None, PropagatorId(2));
        let _ = list.add_watch(x, EnumSet::only(WatchEvent::AnyChange), None, PropagatorId(0));
        let _ = list.add_watch(x, EnumSet::only(WatchEvent::AnyChange), None, PropagatorId(1));

        let (prev, new) = narrowing(4, &[0, 1, 2], &[0, 1]);
        let mut affected = Vec::new();
        list.affected_propagators(x, &prev, &new, &mut affected);
        assert_eq!(affected, vec![PropagatorId(2), PropagatorId(0), PropagatorId(1)]);
    }

    #[test]
    fn event_kinds_are_respected() {
        let mut list = WatchList::default();
        list.grow_to(1);
        let x = VariableId::new(0);
        let _ = list.add_watch(
            x,
            EnumSet::only(WatchEvent::BecameSingleton),
            None,
            PropagatorId(0),
        );
        let _ = list.add_watch(
            x,
            EnumSet::only(WatchEvent::LostValues),
            Some(ValueSet::from_indices(4, [3])),
            PropagatorId(1),
        );
        let _ = list.add_watch(
            x,
            EnumSet::only(WatchEvent::BoundsChange),
            None,
            PropagatorId(2),
        );

        // Losing value 3 changes the upper bound but does not make the set a singleton.
        let (prev, new) = narrowing(4, &[0, 1, 3], &[0, 1]);
        let mut affected = Vec::new();
        list.affected_propagators(x, &prev, &new, &mut affected);
        assert_eq!(affected, vec![PropagatorId(1), PropagatorId(2)]);

        // Interior narrowing to a singleton.
        let (prev, new) = narrowing(4, &[0, 1, 3], &[0, 3]);
        list.affected_propagators(x, &prev, &new, &mut affected);
        assert_eq!(affected, vec![PropagatorId(0)]);
    }

    #[test]
    fn disabled_watchers_are_restored_on_backjump() {
        let mut list = WatchList::default();
        list.grow_to(1);
        let x = VariableId::new(0);
        let handle = list.add_watch(x, EnumSet::only(WatchEvent::AnyChange), None, PropagatorId(0));

        list.disable_until_backtrack(handle, 3);
        let (prev, new) = narrowing(2, &[0, 1], &[0]);
        let mut affected = Vec::new();
        list.affected_propagators(x, &prev, &new, &mut affected);
        assert!(affected.is_empty());

        // Backjumping to level 3 or above keeps the watcher disabled.
        list.on_backjump(3);
        list.affected_propagators(x, &prev, &new, &mut affected);
        assert!(affected.is_empty());

        list.on_backjump(2);
        list.affected_propagators(x, &prev, &new, &mut affected);
        assert_eq!(affected, vec![PropagatorId(0)]);
    }
}

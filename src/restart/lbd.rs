use crate::basic_types::WindowedAverage;
use crate::restart::RestartPolicy;

/// Number of samples in the recent-LBD window.
const LBD_QUEUE_SIZE: usize = 50;
/// Number of samples in the recent trail-size window.
const TRAIL_QUEUE_SIZE: usize = 5000;
/// Minimum conflicts before restarts may be blocked for out-of-band search depths.
const LOWER_BOUND_FOR_BLOCKING_RESTART: u64 = 10000;
/// Scale on the recent LBD average; higher restarts more often.
const LBD_QUEUE_SCALE: f64 = 0.8;
/// Scale on the recent trail-size average; lower blocks restarts more often.
const TRAIL_QUEUE_SCALE: f64 = 1.2;

/// Glucose-style restarts: restart when the recent learned clauses have high LBD compared to
/// the all-time average, but hold off when the trail is much deeper than usual, since the
/// search seems to be getting somewhere.
///
/// The all-time average is a since-construction average; neither blocking nor a restart resets
/// it, only the bounded recent window is cleared.
#[derive(Debug)]
pub(crate) struct LbdRestartPolicy {
    recent_lbds: WindowedAverage,
    recent_trail_sizes: WindowedAverage,
    lbd_total: u64,
    conflict_counter: u64,
}

impl LbdRestartPolicy {
    pub(crate) fn new() -> LbdRestartPolicy {
        LbdRestartPolicy {
            recent_lbds: WindowedAverage::new(LBD_QUEUE_SIZE),
            recent_trail_sizes: WindowedAverage::new(TRAIL_QUEUE_SIZE),
            lbd_total: 0,
            conflict_counter: 0,
        }
    }
}

impl RestartPolicy for LbdRestartPolicy {
    fn on_clause_learned(&mut self, lbd: u32, trail_size: usize) {
        self.lbd_total += u64::from(lbd);
        self.conflict_counter += 1;
        self.recent_lbds.push(u64::from(lbd));
        self.recent_trail_sizes.push(trail_size as u64);
    }

    fn should_restart(&mut self, current_trail_size: usize) -> bool {
        if self.conflict_counter == 0 {
            return false;
        }

        // Block restarts at unusually deep trails.
        if self.conflict_counter > LOWER_BOUND_FOR_BLOCKING_RESTART
            && self.recent_lbds.at_capacity()
            && self.recent_trail_sizes.value() * TRAIL_QUEUE_SCALE < current_trail_size as f64
        {
            self.recent_lbds.clear();
        }

        let lbd_rate = self.lbd_total as f64 / self.conflict_counter as f64;
        self.recent_lbds.at_capacity() && self.recent_lbds.value() * LBD_QUEUE_SCALE > lbd_rate
    }

    fn on_restart(&mut self) {
        self.recent_lbds.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::LbdRestartPolicy;
    use crate::restart::RestartPolicy;

    #[test]
    fn restarts_when_recent_lbds_degrade() {
        let mut policy = LbdRestartPolicy::new();

        // A long stretch of good (low-LBD) clauses establishes a low all-time rate.
        for _ in 0..500 {
            policy.on_clause_learned(2, 50);
        }
        assert!(!policy.should_restart(50));

        // A window full of bad clauses trips the restart.
        for _ in 0..50 {
            policy.on_clause_learned(20, 50);
        }
        assert!(policy.should_restart(50));

        // Restarting clears the window but not the all-time average.
        policy.on_restart();
        assert!(!policy.should_restart(50));
    }
}

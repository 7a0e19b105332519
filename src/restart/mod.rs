//! Restart policies. The engine consults the policy after every learned clause; on a restart
//! it backjumps to the root and informs the policy and the heuristics.

mod lbd;
mod luby;
mod none;

pub(crate) use lbd::LbdRestartPolicy;
pub(crate) use luby::LubyRestartPolicy;
pub(crate) use none::NoRestartPolicy;

/// Which restart policy the solver uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartStrategy {
    /// Luby-sequence conflict thresholds.
    #[default]
    Luby,
    /// Glucose-style LBD-driven restarts with blocking.
    Lbd,
    /// Never restart.
    None,
}

pub(crate) trait RestartPolicy {
    /// Called for every learned clause with its LBD and the trail size at the conflict.
    fn on_clause_learned(&mut self, lbd: u32, trail_size: usize);

    /// `current_trail_size` is the trail size at the moment of the query; the LBD policy uses
    /// it to block restarts at unusually deep search states.
    fn should_restart(&mut self, current_trail_size: usize) -> bool;

    fn on_restart(&mut self);
}

pub(crate) fn make_policy(strategy: RestartStrategy) -> Box<dyn RestartPolicy> {
    match strategy {
        RestartStrategy::Luby => Box::new(LubyRestartPolicy::new()),
        RestartStrategy::Lbd => Box::new(LbdRestartPolicy::new()),
        RestartStrategy::None => Box::new(NoRestartPolicy),
    }
}

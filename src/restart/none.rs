use crate::restart::RestartPolicy;

/// Never restarts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NoRestartPolicy;

impl RestartPolicy for NoRestartPolicy {
    fn on_clause_learned(&mut self, _lbd: u32, _trail_size: usize) {}

    fn should_restart(&mut self, _current_trail_size: usize) -> bool {
        false
    }

    fn on_restart(&mut self) {}
}

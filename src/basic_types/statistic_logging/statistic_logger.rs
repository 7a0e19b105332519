//! Responsible for logging statistics in a uniform `key=value` format, so that runs can be
//! compared by external tooling. Logging is disabled until [`configure`] is called.

use std::fmt::Display;

use once_cell::sync::OnceCell;

static LOGGING_OPTIONS: OnceCell<StatisticOptions> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
struct StatisticOptions {
    prefix: &'static str,
}

/// Enable statistic logging with the given line prefix. Calling this more than once has no
/// effect; the first configuration wins.
pub fn configure(prefix: &'static str) {
    let _ = LOGGING_OPTIONS.set(StatisticOptions { prefix });
}

pub fn should_log_statistics() -> bool {
    LOGGING_OPTIONS.get().is_some()
}

/// Log a single statistic as `<prefix> <name>=<value>` if logging has been configured.
pub fn log_statistic(name: &str, value: impl Display) {
    if let Some(options) = LOGGING_OPTIONS.get() {
        println!("{} {name}={value}", options.prefix);
    }
}

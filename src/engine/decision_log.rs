//! Text decision logs: one line per decision, `<level> <variable-id> <value-index>`. A
//! recorded log can be replayed through
//! [`LogReplayHeuristic`](crate::branching::LogReplayHeuristic) to reproduce a run, and a
//! solved assignment can be dumped for inspection.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use crate::engine::variable_store::VariableStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionLogEntry {
    pub level: usize,
    pub variable_index: u32,
    pub value_index: usize,
}

/// An in-memory decision log, filled during search when logging is enabled.
#[derive(Clone, Debug, Default)]
pub struct SolverDecisionLog {
    entries: Vec<DecisionLogEntry>,
}

impl SolverDecisionLog {
    pub fn entries(&self) -> &[DecisionLogEntry] {
        &self.entries
    }

    pub(crate) fn add_decision(&mut self, level: usize, variable_index: u32, value_index: usize) {
        self.entries.push(DecisionLogEntry {
            level,
            variable_index,
            value_index,
        });
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for entry in &self.entries {
            writeln!(
                writer,
                "{} {} {}",
                entry.level, entry.variable_index, entry.value_index
            )?;
        }
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> std::io::Result<SolverDecisionLog> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut fields = trimmed.split_whitespace();
            let parse_error =
                || std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed decision log");
            let level = fields
                .next()
                .and_then(|field| field.parse().ok())
                .ok_or_else(parse_error)?;
            let variable_index = fields
                .next()
                .and_then(|field| field.parse().ok())
                .ok_or_else(parse_error)?;
            let value_index = fields
                .next()
                .and_then(|field| field.parse().ok())
                .ok_or_else(parse_error)?;
            entries.push(DecisionLogEntry {
                level,
                variable_index,
                value_index,
            });
        }
        Ok(SolverDecisionLog { entries })
    }
}

/// Dump every solved variable as `<name> = <value>`, one per line; a debugging aid.
pub(crate) fn write_solution_dump(
    store: &VariableStore,
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for variable in store.variables() {
        if let Some(value) = store.solved_value(variable) {
            writeln!(writer, "{} = {}", store.name(variable), value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_round_trips_through_a_file() {
        let mut log = SolverDecisionLog::default();
        log.add_decision(1, 4, 2);
        log.add_decision(2, 0, 7);

        let path = std::env::temp_dir().join("warren_decision_log_test.txt");
        log.write_to(&path).unwrap();
        let read_back = SolverDecisionLog::read_from(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(read_back.entries(), log.entries());
    }
}

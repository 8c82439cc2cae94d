//! Per-operation time accounting for one loading phase.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use crate::context::OwnershipTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub package: String,
    pub operation: String,
    pub elapsed: Duration,
}

/// Elapsed time per root operation, index-aligned with the ownership table.
#[derive(Debug, Default)]
pub struct TimingLedger {
    entries: Vec<LedgerEntry>,
    running: Option<(usize, Instant)>,
}

impl TimingLedger {
    pub fn new(table: &OwnershipTable) -> Self {
        Self {
            entries: table
                .iter()
                .map(|e| LedgerEntry {
                    package: e.package.clone(),
                    operation: e.operation.clone(),
                    elapsed: Duration::ZERO,
                })
                .collect(),
            running: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Starts the stopwatch for `index`. A stopwatch that was already running
    /// is discarded.
    pub fn start(&mut self, index: usize) {
        self.running = Some((index, Instant::now()));
    }

    /// Stops the stopwatch and credits its time to the entry it was started
    /// for. Does nothing when no stopwatch runs.
    pub fn stop(&mut self) {
        if let Some((index, started)) = self.running.take() {
            self.add(index, started.elapsed());
        }
    }

    /// Out-of-range indices are ignored.
    pub fn add(&mut self, index: usize, elapsed: Duration) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.elapsed += elapsed;
        }
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|e| e.elapsed).sum()
    }

    /// Renders the profiling report.
    ///
    /// Consecutive entries of the same package form one group: the package
    /// total comes first, then each operation indented beneath it.
    pub fn render(&self) -> String {
        let mut out = String::from("[ModCheck] Time spent on each patch:");
        let mut start = 0;
        while start < self.entries.len() {
            let package = &self.entries[start].package;
            let end = self.entries[start..]
                .iter()
                .position(|e| &e.package != package)
                .map_or(self.entries.len(), |n| start + n);
            let group = &self.entries[start..end];
            let sum: Duration = group.iter().map(|e| e.elapsed).sum();
            let _ = write!(out, "\n{} ms | {}", millis(sum), package);
            for entry in group {
                let _ = write!(out, "\n    {} ms", millis(entry.elapsed));
                if !entry.operation.is_empty() {
                    let _ = write!(out, " | {}", entry.operation);
                }
            }
            start = end;
        }
        let _ = write!(out, "\n{} ms | Total time spent patching", millis(self.total()));
        out
    }
}

fn millis(d: Duration) -> String {
    format!("{:>10.4}", d.as_secs_f64() * 1000.0)
}

//! What a hide/seek or sanitize run reports back to its caller.

use crate::error::Error;
use crate::history::{MoveEntry, OperationRecord};
use std::path::PathBuf;

/// An entry the run could not process. The rest of the run went on.
#[derive(Debug)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub error: Error,
}

impl SkippedEntry {
    pub fn new(path: impl Into<PathBuf>, error: Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

/// Result of a run that touched the filesystem.
#[derive(Debug)]
pub struct RunReport {
    pub record: OperationRecord,
    /// Entries that were already in the requested state.
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntry>,
    /// Index in the history once persisted. `None` for no-op runs.
    pub history_index: Option<usize>,
}

/// Result of a simulated run. Nothing on disk was changed.
#[derive(Debug, Default)]
pub struct DryRunReport {
    pub planned: Vec<MoveEntry>,
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntry>,
    /// Folders the run would create.
    pub created_dirs: Vec<PathBuf>,
    /// Folders the cleanup would remove.
    pub removed_dirs: Vec<PathBuf>,
}

#[derive(Debug)]
pub enum RunOutcome {
    Applied(RunReport),
    DryRun(DryRunReport),
}

impl RunOutcome {
    pub fn record(&self) -> Option<&OperationRecord> {
        match self {
            RunOutcome::Applied(report) => Some(&report.record),
            RunOutcome::DryRun(_) => None,
        }
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        match self {
            RunOutcome::Applied(report) => &report.skipped,
            RunOutcome::DryRun(report) => &report.skipped,
        }
    }

    pub fn unchanged(&self) -> &[PathBuf] {
        match self {
            RunOutcome::Applied(report) => &report.unchanged,
            RunOutcome::DryRun(report) => &report.unchanged,
        }
    }

    /// Changes made, or that would be made in a dry run.
    pub fn changes(&self) -> &[MoveEntry] {
        match self {
            RunOutcome::Applied(report) => &report.record.entries,
            RunOutcome::DryRun(report) => &report.planned,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunOutcome::DryRun(_))
    }
}

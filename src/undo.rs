/// Reversing recorded operations.
///
/// An undo validates the whole record against the disk before it changes
/// anything. Entries are then replayed backwards, so the last step of the
/// original run is reverted first. Once everything is back in place an
/// `undo` marker is appended to the history; the consumed record itself is
/// never edited.
use crate::attr::HideBackend;
use crate::error::{Error, Result};
use crate::fs_util;
use crate::hide_seek::{Direction, HideSeekEngine};
use crate::history::{Fingerprint, HistoryStore, MoveEntry, OpKind, OperationRecord};
use crate::outcome::{RunOutcome, SkippedEntry};
use std::fs;
use std::path::{Path, PathBuf};

/// What an undo restored, or would restore in a dry run.
#[derive(Debug)]
pub struct UndoReport {
    /// Index of the consumed record.
    pub index: usize,
    pub op: OpKind,
    pub path: PathBuf,
    /// Reverted entries, in the order they were reverted.
    pub restored: Vec<MoveEntry>,
    /// Folders removed by a sanitize cleanup, recreated.
    pub recreated_dirs: Vec<PathBuf>,
    /// Sort folders created by a sanitize run, removed again.
    pub removed_dirs: Vec<PathBuf>,
    /// Entries a legacy hide/seek undo could not revert.
    pub skipped: Vec<SkippedEntry>,
    pub dry_run: bool,
    /// Index of the appended marker. `None` for dry runs.
    pub marker_index: Option<usize>,
}

impl UndoReport {
    fn new(index: usize, record: &OperationRecord, dry_run: bool) -> Self {
        Self {
            index,
            op: record.op,
            path: record.path.clone(),
            restored: Vec::new(),
            recreated_dirs: Vec::new(),
            removed_dirs: Vec::new(),
            skipped: Vec::new(),
            dry_run,
            marker_index: None,
        }
    }
}

pub struct UndoManager<'a> {
    backend: &'a dyn HideBackend,
    history: &'a HistoryStore,
}

impl<'a> UndoManager<'a> {
    pub fn new(backend: &'a dyn HideBackend, history: &'a HistoryStore) -> Self {
        Self { backend, history }
    }

    /// Undoes the most recent record that has not been undone yet.
    pub fn undo_last(&self, dry_run: bool) -> Result<UndoReport> {
        let (index, record) = self.history.pending()?.ok_or(Error::NothingToUndo)?;
        self.undo_record(index, &record, dry_run)
    }

    /// Undoes the record at `index`.
    ///
    /// Markers and records already undone are refused.
    pub fn undo_at(&self, index: usize, dry_run: bool) -> Result<UndoReport> {
        let record = self.history.get(index)?.ok_or(Error::NothingToUndo)?;
        if record.op == OpKind::Undo {
            return Err(Error::stale(
                &record.path,
                format!("record {} is an undo marker", index),
            ));
        }
        if self.history.is_consumed(index)? {
            return Err(Error::stale(
                &record.path,
                format!("record {} was already undone", index),
            ));
        }
        self.undo_record(index, &record, dry_run)
    }

    fn undo_record(
        &self,
        index: usize,
        record: &OperationRecord,
        dry_run: bool,
    ) -> Result<UndoReport> {
        let mut report = if is_legacy_hide_seek(record) {
            self.undo_legacy(index, record, dry_run)?
        } else {
            self.validate(record)?;
            let mut report = UndoReport::new(index, record, dry_run);
            if dry_run {
                report.recreated_dirs = record.removed_dirs.clone();
                report.restored = record.entries.iter().rev().cloned().collect();
                report.removed_dirs = record.created_dirs.iter().rev().cloned().collect();
            } else {
                self.execute(record, &mut report)?;
            }
            report
        };

        if !dry_run {
            report.marker_index = Some(
                self.history
                    .append(OperationRecord::undo_marker(index, record))?,
            );
            tracing::info!(
                "undid {} #{} on {}: {} entries restored",
                record.op,
                index,
                record.path.display(),
                report.restored.len()
            );
        }
        Ok(report)
    }

    /// Checks that every step can be reverted, without touching anything.
    fn validate(&self, record: &OperationRecord) -> Result<()> {
        for dir in &record.removed_dirs {
            if fs_util::occupied(dir) && !dir.is_dir() {
                return Err(Error::NameCollision(dir.clone()));
            }
        }

        let mut replay = Replay::default();
        for entry in record.entries.iter().rev() {
            if !replay.exists(&entry.final_path) {
                return Err(Error::stale(
                    &entry.final_path,
                    "entry is no longer where the operation left it",
                ));
            }
            if let Some(recorded) = entry.fingerprint
                && let Some(current) = replay.locate(&entry.final_path)
                && Fingerprint::of(&current).ok() != Some(recorded)
            {
                return Err(Error::stale(
                    &entry.final_path,
                    "entry was modified after the operation",
                ));
            }
            if entry.is_rename() {
                if replay.exists(&entry.original) {
                    return Err(Error::NameCollision(entry.original.clone()));
                }
                replay.push(entry);
            }
        }
        Ok(())
    }

    fn execute(&self, record: &OperationRecord, report: &mut UndoReport) -> Result<()> {
        for dir in record.removed_dirs.iter().rev() {
            if !dir.is_dir() {
                fs::create_dir_all(dir).map_err(|e| Error::from_io(dir, e))?;
                tracing::debug!("recreated {}", dir.display());
            }
            report.recreated_dirs.push(dir.clone());
        }

        for entry in record.entries.iter().rev() {
            if entry.is_rename() {
                if let Some(parent) = entry.original.parent()
                    && !parent.is_dir()
                {
                    fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
                }
                fs_util::rename_no_clobber(&entry.final_path, &entry.original)?;
            } else {
                self.backend
                    .set_hidden(&entry.final_path, record.op == OpKind::Seek)?;
            }
            tracing::debug!(
                "restored {} -> {}",
                entry.final_path.display(),
                entry.original.display()
            );
            report.restored.push(entry.clone());
        }

        for dir in record.created_dirs.iter().rev() {
            if !fs_util::is_empty_dir(dir) {
                tracing::warn!("keeping {}: not empty", dir.display());
                continue;
            }
            fs::remove_dir(dir).map_err(|e| Error::from_io(dir, e))?;
            report.removed_dirs.push(dir.clone());
        }
        Ok(())
    }

    /// Undoes a hide/seek record that predates per-entry logging by running
    /// the opposite operation on the recorded path.
    fn undo_legacy(
        &self,
        index: usize,
        record: &OperationRecord,
        dry_run: bool,
    ) -> Result<UndoReport> {
        let direction = if record.op == OpKind::Hide {
            Direction::Hide
        } else {
            Direction::Seek
        };
        let current = self.backend.target_path(&record.path, direction.hidden())?;
        if !fs_util::occupied(&current) {
            return Err(Error::stale(&current, "path no longer exists"));
        }

        let outcome = HideSeekEngine::new(self.backend).apply(
            &current,
            direction.opposite(),
            record.recursive,
            dry_run,
        )?;

        let mut report = UndoReport::new(index, record, dry_run);
        report.restored = outcome
            .changes()
            .iter()
            .map(|change| MoveEntry::new(&change.final_path, &change.original))
            .collect();
        report.skipped = match outcome {
            RunOutcome::Applied(applied) => applied.skipped,
            RunOutcome::DryRun(planned) => planned.skipped,
        };
        Ok(report)
    }
}

fn is_legacy_hide_seek(record: &OperationRecord) -> bool {
    matches!(record.op, OpKind::Hide | OpKind::Seek) && record.entries.is_empty()
}

/// Simulated reverse replay over the real filesystem.
#[derive(Default)]
struct Replay {
    /// `(from, to)` renames applied so far.
    steps: Vec<(PathBuf, PathBuf)>,
}

impl Replay {
    fn push(&mut self, entry: &MoveEntry) {
        self.steps
            .push((entry.final_path.clone(), entry.original.clone()));
    }

    /// Where `path`, as it would be after the simulated steps, is on disk
    /// now. `None` if a simulated step moved it away.
    fn locate(&self, path: &Path) -> Option<PathBuf> {
        let mut current = path.to_path_buf();
        for (from, to) in self.steps.iter().rev() {
            if let Ok(rest) = current.strip_prefix(to) {
                current = if rest.as_os_str().is_empty() {
                    from.clone()
                } else {
                    from.join(rest)
                };
            } else if current.starts_with(from) {
                return None;
            }
        }
        Some(current)
    }

    fn exists(&self, path: &Path) -> bool {
        self.locate(path).is_some_and(|p| fs_util::occupied(&p))
    }
}

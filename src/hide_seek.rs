/// Hiding and revealing directory trees.
///
/// A recursive walk is snapshotted before anything changes and committed
/// children-first, so renaming a parent (dotfile backend) never invalidates
/// a child path that still has to be processed.
use crate::attr::HideBackend;
use crate::error::{Error, Result};
use crate::fs_util;
use crate::history::{MoveEntry, OpKind, OperationRecord};
use crate::outcome::{DryRunReport, RunOutcome, RunReport, SkippedEntry};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Hide,
    Seek,
}

impl Direction {
    /// The hidden state this direction puts entries into.
    pub fn hidden(self) -> bool {
        matches!(self, Direction::Hide)
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Hide => Direction::Seek,
            Direction::Seek => Direction::Hide,
        }
    }

    pub fn op_kind(self) -> OpKind {
        match self {
            Direction::Hide => OpKind::Hide,
            Direction::Seek => OpKind::Seek,
        }
    }
}

pub struct HideSeekEngine<'a> {
    backend: &'a dyn HideBackend,
}

impl<'a> HideSeekEngine<'a> {
    pub fn new(backend: &'a dyn HideBackend) -> Self {
        Self { backend }
    }

    /// Hides or reveals `path`, and its whole subtree when `recursive`.
    ///
    /// A missing `path` fails the call. Failures on individual entries are
    /// collected in the outcome and the walk continues.
    pub fn apply(
        &self,
        path: &Path,
        direction: Direction,
        recursive: bool,
        dry_run: bool,
    ) -> Result<RunOutcome> {
        let root = absolute_existing(path)?;
        let (targets, mut skipped) = collect_targets(&root, recursive);
        let hidden = direction.hidden();

        if dry_run {
            let mut report = self.plan(&targets, hidden);
            skipped.append(&mut report.skipped);
            report.skipped = skipped;
            return Ok(RunOutcome::DryRun(report));
        }

        let mut record = OperationRecord::new(direction.op_kind(), &root, recursive);
        let mut unchanged = Vec::new();

        for target in targets {
            match self.backend.set_hidden(&target, hidden) {
                Ok(change) if change.changed => {
                    record.entries.push(MoveEntry::new(target, change.path));
                }
                Ok(_) => unchanged.push(target),
                Err(e) => {
                    tracing::warn!("{} skipped {}: {}", direction.op_kind(), target.display(), e);
                    skipped.push(SkippedEntry::new(target, e));
                }
            }
        }

        tracing::info!(
            "{} {} via {}: {} changed, {} unchanged, {} skipped",
            direction.op_kind(),
            root.display(),
            self.backend.name(),
            record.entries.len(),
            unchanged.len(),
            skipped.len()
        );

        Ok(RunOutcome::Applied(RunReport {
            record,
            unchanged,
            skipped,
            history_index: None,
        }))
    }

    fn plan(&self, targets: &[PathBuf], hidden: bool) -> DryRunReport {
        let mut report = DryRunReport::default();

        for target in targets {
            let planned = self.backend.is_hidden(target).and_then(|is_hidden| {
                if is_hidden == hidden {
                    return Ok(None);
                }
                let to = self.backend.target_path(target, hidden)?;
                if &to != target && fs_util::occupied(&to) {
                    return Err(Error::NameCollision(to));
                }
                Ok(Some(to))
            });

            match planned {
                Ok(Some(to)) => report.planned.push(MoveEntry::new(target, to)),
                Ok(None) => report.unchanged.push(target.clone()),
                Err(e) => report.skipped.push(SkippedEntry::new(target, e)),
            }
        }
        report
    }
}

/// Absolute form of `path`, which must exist. Symlinks are not resolved.
pub(crate) fn absolute_existing(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| Error::from_io(path, e))?;
    std::fs::symlink_metadata(&absolute).map_err(|e| Error::from_io(&absolute, e))?;
    if !fs_util::is_recordable(&absolute) {
        return Err(Error::InvalidPath(absolute));
    }
    Ok(absolute)
}

/// Entries to process, children before their parent, siblings by name.
/// Entries whose path is not valid UTF-8 are skipped.
fn collect_targets(root: &Path, recursive: bool) -> (Vec<PathBuf>, Vec<SkippedEntry>) {
    if !recursive {
        return (vec![root.to_path_buf()], Vec::new());
    }

    let mut targets = Vec::new();
    let mut skipped = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if !fs_util::is_recordable(entry.path()) => {
                tracing::warn!("skipping {}: name is not valid UTF-8", entry.path().display());
                skipped.push(SkippedEntry::new(
                    entry.path(),
                    Error::InvalidPath(entry.path().to_path_buf()),
                ));
            }
            Ok(entry) => targets.push(entry.into_path()),
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                let error = match e.into_io_error() {
                    Some(io) => Error::from_io(&path, io),
                    None => Error::InvalidPath(path.clone()),
                };
                tracing::warn!("cannot walk {}: {}", path.display(), error);
                skipped.push(SkippedEntry::new(path, error));
            }
        }
    }
    (targets, skipped)
}

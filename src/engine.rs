//! Entry point tying the hide backend, the engines and the history together.
//!
//! Every mutating call that changes something is persisted as one history
//! record before it returns; dry runs and no-op runs leave the history alone.

use crate::attr::{HideBackend, platform_backend};
use crate::error::Result;
use crate::file_category::FileMapper;
use crate::filter::CompiledFilters;
use crate::fs_util;
use crate::hide_seek::{Direction, HideSeekEngine};
use crate::history::{HistoryStore, OperationRecord};
use crate::outcome::RunOutcome;
use crate::sanitizer::{SanitizeOptions, Sanitizer};
use crate::undo::{UndoManager, UndoReport};
use std::path::{Path, PathBuf};

pub struct Engine {
    backend: Box<dyn HideBackend>,
    history: HistoryStore,
    mapper: FileMapper,
    filters: CompiledFilters,
    protected: Vec<PathBuf>,
}

impl Engine {
    pub fn new(backend: Box<dyn HideBackend>, history: HistoryStore) -> Self {
        Self {
            backend,
            history,
            mapper: FileMapper::new(),
            filters: CompiledFilters::default(),
            protected: Vec::new(),
        }
    }

    /// Engine using the host's native hide mechanism.
    pub fn with_platform_backend(history: HistoryStore) -> Self {
        Self::new(platform_backend(), history)
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Paths sanitize must never move, on top of the history file.
    pub fn with_protected(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.protected.extend(paths);
        self
    }

    pub fn backend(&self) -> &dyn HideBackend {
        self.backend.as_ref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn is_hidden(&self, path: &Path) -> Result<bool> {
        self.backend.is_hidden(path)
    }

    pub fn hide(&self, path: &Path, recursive: bool, dry_run: bool) -> Result<RunOutcome> {
        self.hide_or_seek(path, Direction::Hide, recursive, dry_run)
    }

    /// Reveals `path`. When `path` is gone but its hidden variant exists
    /// (`photos` after `photos` became `.photos`), the variant is used.
    pub fn seek(&self, path: &Path, recursive: bool, dry_run: bool) -> Result<RunOutcome> {
        self.hide_or_seek(path, Direction::Seek, recursive, dry_run)
    }

    pub fn hide_or_seek(
        &self,
        path: &Path,
        direction: Direction,
        recursive: bool,
        dry_run: bool,
    ) -> Result<RunOutcome> {
        let mut target = path.to_path_buf();
        if direction == Direction::Seek
            && !fs_util::occupied(path)
            && let Ok(hidden) = self.backend.target_path(path, true)
            && fs_util::occupied(&hidden)
        {
            tracing::debug!("{} not found, using {}", path.display(), hidden.display());
            target = hidden;
        }

        let engine = HideSeekEngine::new(self.backend.as_ref());
        let outcome = engine.apply(&target, direction, recursive, dry_run)?;
        self.persist(outcome)
    }

    pub fn sanitize(&self, path: &Path, options: &SanitizeOptions) -> Result<RunOutcome> {
        let mut sanitizer =
            Sanitizer::new(&self.mapper, &self.filters).protect(self.history.path());
        for protected in &self.protected {
            sanitizer = sanitizer.protect(protected);
        }
        let outcome = sanitizer.sanitize(path, options)?;
        self.persist(outcome)
    }

    pub fn undo_last(&self, dry_run: bool) -> Result<UndoReport> {
        UndoManager::new(self.backend.as_ref(), &self.history).undo_last(dry_run)
    }

    pub fn undo_at(&self, index: usize, dry_run: bool) -> Result<UndoReport> {
        UndoManager::new(self.backend.as_ref(), &self.history).undo_at(index, dry_run)
    }

    /// Every history record, oldest first.
    pub fn records(&self) -> Result<Vec<OperationRecord>> {
        self.history.all()
    }

    fn persist(&self, outcome: RunOutcome) -> Result<RunOutcome> {
        let RunOutcome::Applied(mut report) = outcome else {
            return Ok(outcome);
        };
        let record = &report.record;
        if record.entries.is_empty()
            && record.created_dirs.is_empty()
            && record.removed_dirs.is_empty()
        {
            tracing::debug!("{} on {} changed nothing", record.op, record.path.display());
            return Ok(RunOutcome::Applied(report));
        }

        let index = self.history.append(report.record.clone())?;
        tracing::debug!("recorded {} as history #{}", report.record.op, index);
        report.history_index = Some(index);
        Ok(RunOutcome::Applied(report))
    }
}

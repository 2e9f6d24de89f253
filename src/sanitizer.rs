/// Privacy renaming and type/date sorting of a directory's files.
///
/// A run snapshots the candidate files first, computes every destination,
/// then moves entries one by one. A move whose destination is still held by
/// a file that is itself about to move waits until that file is gone. Sort folders it creates and empty folders
/// its cleanup removes are recorded next to the moves so the run can be
/// reversed exactly.
use crate::error::{Error, Result};
use crate::file_category::FileMapper;
use crate::filter::CompiledFilters;
use crate::fs_util;
use crate::hide_seek::absolute_existing;
use crate::history::{Fingerprint, MoveEntry, OpKind, OperationRecord};
use crate::outcome::{DryRunReport, RunOutcome, RunReport, SkippedEntry};
use chrono::{DateTime, Local, NaiveDate};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `DDMMYY`, the date part of sanitized names.
pub const NAME_DATE_FORMAT: &str = "%d%m%y";
/// `YYYY-MM-DD`, the name of date sort folders.
pub const FOLDER_DATE_FORMAT: &str = "%Y-%m-%d";

const MIN_SEQUENCE_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    None,
    Type,
    Date,
    TypeAndDate,
}

impl SortMode {
    pub fn from_flags(by_type: bool, by_date: bool) -> Self {
        match (by_type, by_date) {
            (false, false) => SortMode::None,
            (true, false) => SortMode::Type,
            (false, true) => SortMode::Date,
            (true, true) => SortMode::TypeAndDate,
        }
    }
}

/// Which timestamp stands for "the file's date".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSource {
    #[default]
    Modified,
    /// Falls back to the modification time where the platform has no birth time.
    Created,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Rename files to `NNN_DDMMYY.ext`.
    pub rename: bool,
    pub sort: SortMode,
    pub recursive: bool,
    /// Remove folders left empty once all moves are done.
    pub cleanup: bool,
    pub dry_run: bool,
    pub date_source: DateSource,
}

impl SanitizeOptions {
    /// The "complete sanitize" preset: rename, sort by type and date,
    /// recurse and clean up.
    pub fn complete() -> Self {
        Self {
            rename: true,
            sort: SortMode::TypeAndDate,
            recursive: true,
            cleanup: true,
            ..Self::default()
        }
    }
}

pub struct Sanitizer<'a> {
    mapper: &'a FileMapper,
    filters: &'a CompiledFilters,
    protected: Vec<PathBuf>,
}

impl<'a> Sanitizer<'a> {
    pub fn new(mapper: &'a FileMapper, filters: &'a CompiledFilters) -> Self {
        Self {
            mapper,
            filters,
            protected: Vec::new(),
        }
    }

    /// Never touch `path`, whatever the filters say.
    pub fn protect(mut self, path: &Path) -> Self {
        if let Ok(absolute) = std::path::absolute(path) {
            self.protected.push(absolute);
        }
        self
    }

    /// Sanitizes the directory at `path`.
    ///
    /// The root must exist and be a directory. Per-entry failures are
    /// collected and the run continues.
    pub fn sanitize(&self, path: &Path, options: &SanitizeOptions) -> Result<RunOutcome> {
        let root = absolute_existing(path)?;
        if !root.is_dir() {
            return Err(Error::InvalidPath(root));
        }

        let (files, mut skipped) = self.collect_files(&root, options.recursive);
        let mut unchanged = Vec::new();
        let plan = self.plan(&root, &files, options, &mut unchanged, &mut skipped);
        let (ordered, blocked) = schedule(plan);
        for entry in blocked {
            tracing::warn!(
                "sanitize skipped {}: {} is taken",
                entry.original.display(),
                entry.final_path.display()
            );
            skipped.push(SkippedEntry::new(
                entry.original,
                Error::NameCollision(entry.final_path),
            ));
        }

        if options.dry_run {
            return Ok(RunOutcome::DryRun(self.dry_run_report(
                &root, ordered, options, unchanged, skipped,
            )));
        }

        let mut record = OperationRecord::new(OpKind::Sanitize, &root, options.recursive);
        for entry in ordered {
            let moved = self
                .ensure_dir(&root, parent_of(&entry.final_path), &mut record.created_dirs)
                .and_then(|()| fs_util::rename_no_clobber(&entry.original, &entry.final_path));
            match moved {
                Ok(()) => {
                    tracing::debug!(
                        "moved {} -> {}",
                        entry.original.display(),
                        entry.final_path.display()
                    );
                    record.entries.push(entry);
                }
                Err(e) => {
                    tracing::warn!("sanitize skipped {}: {}", entry.original.display(), e);
                    skipped.push(SkippedEntry::new(entry.original, e));
                }
            }
        }

        // Folders created for moves that then failed hold nothing.
        record.created_dirs = prune_empty(std::mem::take(&mut record.created_dirs));

        if options.cleanup {
            record.removed_dirs = self.remove_empty_dirs(&root, &mut skipped);
        }

        tracing::info!(
            "sanitized {}: {} moved, {} folders created, {} removed, {} skipped",
            root.display(),
            record.entries.len(),
            record.created_dirs.len(),
            record.removed_dirs.len(),
            skipped.len()
        );

        Ok(RunOutcome::Applied(RunReport {
            record,
            unchanged,
            skipped,
            history_index: None,
        }))
    }

    /// Candidate files, depth-first with siblings sorted by name. Files whose
    /// path is not valid UTF-8 are skipped.
    fn collect_files(&self, root: &Path, recursive: bool) -> (Vec<PathBuf>, Vec<SkippedEntry>) {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.accepts(root, entry.path()));

        for entry in walker {
            match entry {
                Ok(entry) if !entry.file_type().is_file() => {}
                Ok(entry) if !fs_util::is_recordable(entry.path()) => {
                    tracing::warn!(
                        "skipping {}: name is not valid UTF-8",
                        entry.path().display()
                    );
                    skipped.push(SkippedEntry::new(
                        entry.path(),
                        Error::InvalidPath(entry.path().to_path_buf()),
                    ));
                }
                Ok(entry) => files.push(entry.into_path()),
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    tracing::warn!("cannot walk {}: {}", path.display(), e);
                    if let Some(io) = e.into_io_error() {
                        skipped.push(SkippedEntry::new(&path, Error::from_io(&path, io)));
                    }
                }
            }
        }
        (files, skipped)
    }

    fn accepts(&self, root: &Path, path: &Path) -> bool {
        if self.protected.iter().any(|p| p == path) {
            return false;
        }
        match path.strip_prefix(root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                self.filters.should_include(relative)
            }
            _ => true,
        }
    }

    /// Destination of every file that has to move, with the file's current
    /// fingerprint.
    fn plan(
        &self,
        root: &Path,
        files: &[PathBuf],
        options: &SanitizeOptions,
        unchanged: &mut Vec<PathBuf>,
        skipped: &mut Vec<SkippedEntry>,
    ) -> Vec<MoveEntry> {
        let width = files.len().to_string().len().max(MIN_SEQUENCE_WIDTH);
        let mut claimed = HashSet::new();
        let mut plan = Vec::new();

        for (index, file) in files.iter().enumerate() {
            let stamped = file_date(file, options.date_source)
                .and_then(|date| Fingerprint::of(file).map(|fingerprint| (date, fingerprint)));
            let (date, fingerprint) = match stamped {
                Ok(stamped) => stamped,
                Err(e) => {
                    skipped.push(SkippedEntry::new(file, e));
                    continue;
                }
            };

            let folder = match options.sort {
                SortMode::None => parent_of(file).to_path_buf(),
                SortMode::Type => root.join(self.mapper.categorize_path(file).dir_name()),
                SortMode::Date => root.join(date.format(FOLDER_DATE_FORMAT).to_string()),
                SortMode::TypeAndDate => root
                    .join(self.mapper.categorize_path(file).dir_name())
                    .join(date.format(FOLDER_DATE_FORMAT).to_string()),
            };

            let destination = if options.rename {
                folder.join(sanitized_name(index + 1, width, date, file))
            } else {
                match file.file_name() {
                    Some(name) => folder.join(name),
                    None => {
                        skipped.push(SkippedEntry::new(file, Error::InvalidPath(file.clone())));
                        continue;
                    }
                }
            };

            if &destination == file {
                unchanged.push(file.clone());
                continue;
            }
            if !claimed.insert(destination.clone()) {
                skipped.push(SkippedEntry::new(file, Error::NameCollision(destination)));
                continue;
            }
            plan.push(MoveEntry::new(file, destination).with_fingerprint(fingerprint));
        }
        plan
    }

    /// Creates `dir` and any missing ancestors below `root`, recording each.
    fn ensure_dir(&self, root: &Path, dir: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = dir;
        while current != root && !fs_util::occupied(current) {
            missing.push(current.to_path_buf());
            current = match current.parent() {
                Some(parent) => parent,
                None => break,
            };
        }
        if !current.is_dir() {
            return Err(Error::NameCollision(current.to_path_buf()));
        }

        for dir in missing.into_iter().rev() {
            fs::create_dir(&dir).map_err(|e| Error::from_io(&dir, e))?;
            tracing::debug!("created {}", dir.display());
            created.push(dir);
        }
        Ok(())
    }

    /// Removes empty folders bottom-up, never `root` itself.
    fn remove_empty_dirs(&self, root: &Path, skipped: &mut Vec<SkippedEntry>) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        for dir in self.dirs_bottom_up(root) {
            if !fs_util::is_empty_dir(&dir) {
                continue;
            }
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    tracing::debug!("removed empty {}", dir.display());
                    removed.push(dir);
                }
                Err(e) => {
                    tracing::warn!("cannot remove {}: {}", dir.display(), e);
                    skipped.push(SkippedEntry::new(&dir, Error::from_io(&dir, e)));
                }
            }
        }
        removed
    }

    fn dirs_bottom_up(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.accepts(root, entry.path()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir() && fs_util::is_recordable(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Walks `ordered` the way a real run would, tracking which sources
    /// have already left and which folders would exist by then.
    fn dry_run_report(
        &self,
        root: &Path,
        ordered: Vec<MoveEntry>,
        options: &SanitizeOptions,
        unchanged: Vec<PathBuf>,
        mut skipped: Vec<SkippedEntry>,
    ) -> DryRunReport {
        let mut planned = Vec::new();
        let mut created_dirs: Vec<PathBuf> = Vec::new();
        let mut receiving: HashSet<PathBuf> = HashSet::new();
        let mut vacated: HashSet<PathBuf> = HashSet::new();
        let present = |path: &Path, vacated: &HashSet<PathBuf>| {
            fs_util::occupied(path) && !vacated.contains(path)
        };

        for entry in ordered {
            let folder = parent_of(&entry.final_path);
            let mut missing = Vec::new();
            let mut blocker = None;
            for ancestor in folder.ancestors().take_while(|a| *a != root) {
                if created_dirs.iter().any(|d| d == ancestor) {
                    break;
                }
                if present(ancestor, &vacated) {
                    if !ancestor.is_dir() {
                        blocker = Some(ancestor.to_path_buf());
                    }
                    break;
                }
                missing.push(ancestor.to_path_buf());
            }
            if blocker.is_none() && present(&entry.final_path, &vacated) {
                blocker = Some(entry.final_path.clone());
            }
            if let Some(blocker) = blocker {
                skipped.push(SkippedEntry::new(
                    &entry.original,
                    Error::NameCollision(blocker),
                ));
                continue;
            }

            created_dirs.extend(missing.into_iter().rev());
            receiving.extend(
                folder
                    .ancestors()
                    .take_while(|a| *a != root)
                    .map(Path::to_path_buf),
            );
            vacated.insert(entry.original.clone());
            planned.push(entry);
        }

        let removed_dirs = if options.cleanup {
            let moved_out: HashSet<&Path> = planned.iter().map(|e| e.original.as_path()).collect();
            self.plan_cleanup(root, &moved_out, &receiving)
        } else {
            Vec::new()
        };

        DryRunReport {
            planned,
            unchanged,
            skipped,
            created_dirs,
            removed_dirs,
        }
    }

    /// Folders that would be empty once `moved_out` have left.
    fn plan_cleanup(
        &self,
        root: &Path,
        moved_out: &HashSet<&Path>,
        receiving: &HashSet<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut removable: Vec<PathBuf> = Vec::new();
        for dir in self.dirs_bottom_up(root) {
            if receiving.contains(&dir) {
                continue;
            }
            let empty_after = fs::read_dir(&dir)
                .map(|entries| {
                    entries.flatten().all(|child| {
                        let child = child.path();
                        moved_out.contains(child.as_path()) || removable.contains(&child)
                    })
                })
                .unwrap_or(false);
            if empty_after {
                removable.push(dir);
            }
        }
        removable
    }
}

/// Orders `plan` so that no entry lands on a file another entry has yet to
/// move away. Returns the runnable order and the entries whose destination
/// stays taken.
fn schedule(plan: Vec<MoveEntry>) -> (Vec<MoveEntry>, Vec<MoveEntry>) {
    let mut waiting: HashSet<PathBuf> = plan.iter().map(|e| e.original.clone()).collect();
    let mut vacated: HashSet<PathBuf> = HashSet::new();
    let mut ordered = Vec::new();
    let mut blocked = Vec::new();
    let mut pending = plan;

    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();
        for entry in pending {
            let destination = &entry.final_path;
            if !fs_util::occupied(destination) || vacated.contains(destination) {
                waiting.remove(&entry.original);
                vacated.insert(entry.original.clone());
                ordered.push(entry);
            } else if waiting.contains(destination) {
                deferred.push(entry);
            } else {
                blocked.push(entry);
            }
        }

        if deferred.len() == before {
            // Cycle, or waiting on an entry that is blocked itself.
            blocked.append(&mut deferred);
        }
        pending = deferred;
    }
    (ordered, blocked)
}

fn parent_of(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

fn prune_empty(created: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept = created;
    let mut index = kept.len();
    while index > 0 {
        index -= 1;
        if fs_util::is_empty_dir(&kept[index]) && fs::remove_dir(&kept[index]).is_ok() {
            kept.remove(index);
        }
    }
    kept
}

/// `NNN_DDMMYY` plus the lowercased extension of `file`.
pub fn sanitized_name(sequence: usize, width: usize, date: NaiveDate, file: &Path) -> String {
    let extension = file
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    format!(
        "{:0width$}_{}{}",
        sequence,
        date.format(NAME_DATE_FORMAT),
        extension,
        width = width
    )
}

/// The file's date in local time.
pub fn file_date(path: &Path, source: DateSource) -> Result<NaiveDate> {
    let metadata = fs::metadata(path).map_err(|e| Error::from_io(path, e))?;
    let time = match source {
        DateSource::Modified => metadata.modified(),
        DateSource::Created => metadata.created().or_else(|e| {
            tracing::debug!("no birth time for {} ({}), using mtime", path.display(), e);
            metadata.modified()
        }),
    }
    .map_err(|e| Error::from_io(path, e))?;

    Ok(DateTime::<Local>::from(time).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use tempfile::TempDir;

    fn set_date(path: &Path, year: i32, month: u32, day: u32) {
        let time = Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("valid local time");
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time.into())
            .unwrap();
    }

    fn write_dated(dir: &Path, name: &str, day: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        set_date(&path, 2024, 1, day);
        path
    }

    fn run(root: &Path, options: &SanitizeOptions) -> RunOutcome {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        Sanitizer::new(&mapper, &filters)
            .sanitize(root, options)
            .unwrap()
    }

    #[test]
    fn test_sanitized_name_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(
            sanitized_name(7, 3, date, Path::new("IMG_1234.JPG")),
            "007_050124.jpg"
        );
        assert_eq!(sanitized_name(12, 4, date, Path::new("README")), "0012_050124");
    }

    #[test]
    fn test_sort_mode_from_flags() {
        assert_eq!(SortMode::from_flags(false, false), SortMode::None);
        assert_eq!(SortMode::from_flags(true, true), SortMode::TypeAndDate);
    }

    #[test]
    fn test_rename_and_sort_by_type() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, "a.txt", 5);
        write_dated(root, "b.jpg", 5);

        let options = SanitizeOptions {
            rename: true,
            sort: SortMode::Type,
            ..Default::default()
        };
        let outcome = run(root, &options);

        assert!(root.join("documents").join("001_050124.txt").exists());
        assert!(root.join("images").join("002_050124.jpg").exists());
        let record = outcome.record().unwrap();
        assert_eq!(record.entries.len(), 2);
        assert_eq!(
            record.created_dirs,
            vec![root.join("documents"), root.join("images")]
        );
    }

    #[test]
    fn test_same_date_names_are_distinct() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        for name in ["x.txt", "y.txt", "z.txt"] {
            write_dated(root, name, 9);
        }

        let outcome = run(
            root,
            &SanitizeOptions {
                rename: true,
                ..Default::default()
            },
        );

        let finals: HashSet<_> = outcome
            .changes()
            .iter()
            .map(|e| e.final_path.clone())
            .collect();
        assert_eq!(finals.len(), 3);
        assert!(root.join("003_090124.txt").exists());
    }

    #[test]
    fn test_sort_by_date_nested_under_type() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, "song.mp3", 20);

        let outcome = run(
            root,
            &SanitizeOptions {
                sort: SortMode::TypeAndDate,
                ..Default::default()
            },
        );

        let expected = root.join("audio").join("2024-01-20").join("song.mp3");
        assert!(expected.exists());
        assert_eq!(
            outcome.record().unwrap().created_dirs,
            vec![root.join("audio"), root.join("audio").join("2024-01-20")]
        );
    }

    #[test]
    fn test_non_recursive_ignores_subfolders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("nested")).unwrap();
        write_dated(&root.join("nested"), "deep.txt", 3);

        let outcome = run(
            root,
            &SanitizeOptions {
                sort: SortMode::Type,
                ..Default::default()
            },
        );

        assert!(outcome.changes().is_empty());
        assert!(root.join("nested").join("deep.txt").exists());
    }

    #[test]
    fn test_recursive_cleanup_removes_emptied_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("old").join("inner")).unwrap();
        write_dated(&root.join("old").join("inner"), "deep.txt", 3);
        fs::create_dir(root.join("empty")).unwrap();

        let outcome = run(
            root,
            &SanitizeOptions {
                sort: SortMode::Type,
                recursive: true,
                cleanup: true,
                ..Default::default()
            },
        );

        assert!(root.join("documents").join("deep.txt").exists());
        assert!(!root.join("old").exists());
        assert!(!root.join("empty").exists());
        let removed = &outcome.record().unwrap().removed_dirs;
        assert_eq!(
            removed,
            &vec![
                root.join("empty"),
                root.join("old").join("inner"),
                root.join("old")
            ]
        );
    }

    #[test]
    fn test_existing_destination_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, "a.txt", 5);
        fs::create_dir(root.join("documents")).unwrap();
        fs::write(root.join("documents").join("a.txt"), "older").unwrap();

        let outcome = run(
            root,
            &SanitizeOptions {
                sort: SortMode::Type,
                ..Default::default()
            },
        );

        assert_eq!(outcome.skipped().len(), 1);
        assert!(matches!(outcome.skipped()[0].error, Error::NameCollision(_)));
        assert!(root.join("a.txt").exists());
        assert_eq!(
            fs::read_to_string(root.join("documents").join("a.txt")).unwrap(),
            "older"
        );
    }

    #[test]
    fn test_hidden_files_left_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, ".profile", 5);

        let outcome = run(
            root,
            &SanitizeOptions {
                rename: true,
                ..Default::default()
            },
        );
        assert!(outcome.changes().is_empty());
        assert!(root.join(".profile").exists());
    }

    #[test]
    fn test_protected_path_is_never_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let history = write_dated(root, "history.json", 5);

        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let outcome = Sanitizer::new(&mapper, &filters)
            .protect(&history)
            .sanitize(
                root,
                &SanitizeOptions {
                    sort: SortMode::Type,
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(outcome.changes().is_empty());
        assert!(history.exists());
    }

    #[test]
    fn test_dry_run_plans_moves_and_cleanup() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("old")).unwrap();
        write_dated(&root.join("old"), "notes.txt", 3);

        let options = SanitizeOptions {
            sort: SortMode::Type,
            recursive: true,
            cleanup: true,
            dry_run: true,
            ..Default::default()
        };
        let outcome = run(root, &options);

        let RunOutcome::DryRun(report) = outcome else {
            panic!("expected a dry run");
        };
        assert_eq!(report.planned.len(), 1);
        assert_eq!(report.planned[0].original, root.join("old").join("notes.txt"));
        assert_eq!(
            report.planned[0].final_path,
            root.join("documents").join("notes.txt")
        );
        assert_eq!(report.planned[0].fingerprint.map(|f| f.len), Some(9));
        assert_eq!(report.created_dirs, vec![root.join("documents")]);
        assert_eq!(report.removed_dirs, vec![root.join("old")]);
        assert!(root.join("old").join("notes.txt").exists());
        assert!(!root.join("documents").exists());
    }

    #[test]
    fn test_moves_record_fingerprints() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, "a.txt", 5);

        let outcome = run(
            root,
            &SanitizeOptions {
                rename: true,
                ..Default::default()
            },
        );

        let moved = root.join("001_050124.txt");
        assert_eq!(outcome.changes().len(), 1);
        assert_eq!(
            outcome.changes()[0].fingerprint,
            Some(Fingerprint::of(&moved).unwrap())
        );
    }

    #[test]
    fn test_destination_freed_earlier_in_run_is_used() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, "002_050124.txt", 5);
        write_dated(root, "a.txt", 5);
        let options = SanitizeOptions {
            rename: true,
            dry_run: true,
            ..Default::default()
        };

        let planned = run(root, &options);
        assert_eq!(planned.changes().len(), 2);
        assert!(planned.skipped().is_empty());

        let done = run(
            root,
            &SanitizeOptions {
                dry_run: false,
                ..options
            },
        );
        assert_eq!(done.changes(), planned.changes());
        assert_eq!(
            fs::read_to_string(root.join("002_050124.txt")).unwrap(),
            "a.txt"
        );
    }

    #[test]
    fn test_move_waits_for_destination_to_be_vacated() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_dated(root, "000.txt", 5);
        write_dated(root, "001_050124.txt", 5);
        let options = SanitizeOptions {
            rename: true,
            ..Default::default()
        };

        let planned = run(
            root,
            &SanitizeOptions {
                dry_run: true,
                ..options.clone()
            },
        );
        let done = run(root, &options);

        assert!(done.skipped().is_empty());
        assert_eq!(done.changes(), planned.changes());
        let originals: Vec<_> = done.changes().iter().map(|e| &e.original).collect();
        assert_eq!(
            originals,
            vec![&root.join("001_050124.txt"), &root.join("000.txt")]
        );
        assert_eq!(
            fs::read_to_string(root.join("001_050124.txt")).unwrap(),
            "000.txt"
        );
        assert_eq!(
            fs::read_to_string(root.join("002_050124.txt")).unwrap(),
            "001_050124.txt"
        );
    }

    #[test]
    fn test_schedule_blocks_cycles() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let (ordered, blocked) = schedule(vec![MoveEntry::new(&a, &b), MoveEntry::new(&b, &a)]);

        assert!(ordered.is_empty());
        assert_eq!(blocked.len(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_skipped_before_moving() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let odd = root.join(OsStr::from_bytes(b"caf\xe9.txt"));
        fs::write(&odd, "x").unwrap();
        write_dated(root, "a.txt", 5);

        let outcome = run(
            root,
            &SanitizeOptions {
                sort: SortMode::Type,
                ..Default::default()
            },
        );

        assert!(odd.exists());
        assert_eq!(outcome.skipped().len(), 1);
        assert!(matches!(&outcome.skipped()[0].error, Error::InvalidPath(p) if *p == odd));
        assert!(root.join("documents").join("a.txt").exists());
        assert!(serde_json::to_string(outcome.record().unwrap()).is_ok());
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let result = Sanitizer::new(&mapper, &filters).sanitize(&file, &SanitizeOptions::default());
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_complete_preset() {
        let options = SanitizeOptions::complete();
        assert!(options.rename && options.recursive && options.cleanup);
        assert_eq!(options.sort, SortMode::TypeAndDate);
        assert!(!options.dry_run);
    }
}

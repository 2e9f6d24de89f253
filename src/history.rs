/// Durable operation history.
///
/// Every mutating run appends one [`OperationRecord`] to a JSON array on disk.
/// Records are never edited or removed: undoing a record appends an `undo`
/// marker that points back at it by index.
use crate::error::{Error, Result};
use crate::fs_util;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the history log inside the home directory.
pub const HISTORY_FILE_NAME: &str = ".hns_history.json";

/// What kind of operation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Hide,
    Seek,
    Sanitize,
    /// Marker consuming an earlier record. Never undone itself.
    Undo,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Hide => "hide",
            OpKind::Seek => "seek",
            OpKind::Sanitize => "sanitize",
            OpKind::Undo => "undo",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry moved, renamed or re-flagged during a run.
///
/// Paths are the ones valid at the moment of that step, so replaying the
/// list backwards restores every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    #[serde(alias = "src")]
    pub original: PathBuf,
    #[serde(rename = "final", alias = "dst")]
    pub final_path: PathBuf,
    /// Size and mtime of a moved file. Absent for flag changes, folders and
    /// records written before fingerprints existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
}

impl MoveEntry {
    pub fn new(original: impl Into<PathBuf>, final_path: impl Into<PathBuf>) -> Self {
        Self {
            original: original.into(),
            final_path: final_path.into(),
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// False for attribute-only changes, where the entry kept its path.
    pub fn is_rename(&self) -> bool {
        self.original != self.final_path
    }
}

/// Size and modification time of a file, both of which survive a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub len: u64,
    /// Seconds since the Unix epoch.
    pub mtime: i64,
    #[serde(default)]
    pub mtime_nanos: u32,
}

impl Fingerprint {
    /// Fingerprint of the entry at `path`. Symlinks are not followed.
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::symlink_metadata(path).map_err(|e| Error::from_io(path, e))?;
        let modified = metadata.modified().map_err(|e| Error::from_io(path, e))?;
        let modified = DateTime::<Utc>::from(modified);
        Ok(Self {
            len: metadata.len(),
            mtime: modified.timestamp(),
            mtime_nanos: modified.timestamp_subsec_nanos(),
        })
    }
}

/// A completed operation, with everything needed to reverse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub op: OpKind,
    /// Absolute target path before the operation ran.
    #[serde(alias = "root")]
    pub path: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default, alias = "moves", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<MoveEntry>,
    /// Sort folders a sanitize run created.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created_dirs: Vec<PathBuf>,
    /// Empty folders a sanitize cleanup removed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_dirs: Vec<PathBuf>,
    /// For `undo` markers, the index of the consumed record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undoes: Option<usize>,
}

impl OperationRecord {
    pub fn new(op: OpKind, path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            op,
            path: path.into(),
            recursive,
            entries: Vec::new(),
            created_dirs: Vec::new(),
            removed_dirs: Vec::new(),
            undoes: None,
        }
    }

    /// Builds the marker appended after `consumed` has been reversed.
    pub fn undo_marker(index: usize, consumed: &OperationRecord) -> Self {
        Self {
            undoes: Some(index),
            ..Self::new(OpKind::Undo, consumed.path.clone(), consumed.recursive)
        }
    }

    /// Local time of the record, if the timestamp is representable.
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp_millis((self.timestamp * 1000.0) as i64)
            .map(|dt| dt.with_timezone(&Local))
    }
}

/// Append-only store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.hns_history.json`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record, oldest first. A missing file is an empty history.
    pub fn all(&self) -> Result<Vec<OperationRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::CorruptHistory(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| Error::CorruptHistory(format!("{}: {}", self.path.display(), e)))
    }

    /// Appends `record` and returns its index.
    ///
    /// The whole file is rewritten through a temp file and a rename, so a
    /// crash leaves either the old or the new history, never a torn one.
    pub fn append(&self, record: OperationRecord) -> Result<usize> {
        let mut records = self.all()?;
        records.push(record);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| Error::CorruptHistory(format!("serialization failed: {}", e)))?;
        fs_util::write_atomic(&self.path, json.as_bytes())?;

        Ok(records.len() - 1)
    }

    /// The most recently appended record of any kind.
    pub fn latest(&self) -> Result<Option<OperationRecord>> {
        Ok(self.all()?.pop())
    }

    pub fn get(&self, index: usize) -> Result<Option<OperationRecord>> {
        Ok(self.all()?.into_iter().nth(index))
    }

    /// The most recent record that can still be undone, with its index.
    pub fn pending(&self) -> Result<Option<(usize, OperationRecord)>> {
        let records = self.all()?;
        let consumed = consumed_indices(&records);

        Ok(records
            .into_iter()
            .enumerate()
            .rev()
            .find(|(index, record)| record.op != OpKind::Undo && !consumed.contains(index)))
    }

    /// Whether the record at `index` has already been undone.
    pub fn is_consumed(&self, index: usize) -> Result<bool> {
        Ok(consumed_indices(&self.all()?).contains(&index))
    }
}

fn consumed_indices(records: &[OperationRecord]) -> HashSet<usize> {
    records.iter().filter_map(|record| record.undoes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> HistoryStore {
        HistoryStore::new(temp_dir.path().join("history.json"))
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let history = store(&temp_dir);
        assert!(history.all().unwrap().is_empty());
        assert!(history.latest().unwrap().is_none());
        assert!(history.pending().unwrap().is_none());
    }

    #[test]
    fn test_append_preserves_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let history = store(&temp_dir);

        let first = history
            .append(OperationRecord::new(OpKind::Hide, "/a", false))
            .unwrap();
        let second = history
            .append(OperationRecord::new(OpKind::Seek, "/b", true))
            .unwrap();

        assert_eq!((first, second), (0, 1));
        let records = history.all().unwrap();
        assert_eq!(records[0].op, OpKind::Hide);
        assert_eq!(records[1].path, PathBuf::from("/b"));
        assert_eq!(history.latest().unwrap().unwrap().op, OpKind::Seek);
    }

    #[test]
    fn test_pending_skips_consumed_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let history = store(&temp_dir);

        let hide = OperationRecord::new(OpKind::Hide, "/a", false);
        let sanitize = OperationRecord::new(OpKind::Sanitize, "/b", false);
        history.append(hide).unwrap();
        history.append(sanitize.clone()).unwrap();
        history
            .append(OperationRecord::undo_marker(1, &sanitize))
            .unwrap();

        let (index, record) = history.pending().unwrap().unwrap();
        assert_eq!(index, 0);
        assert_eq!(record.op, OpKind::Hide);
        assert!(history.is_consumed(1).unwrap());
        assert!(!history.is_consumed(0).unwrap());
        assert_eq!(history.all().unwrap().len(), 3);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let history = store(&temp_dir);
        fs::write(history.path(), "{ not json").unwrap();

        assert!(matches!(history.all(), Err(Error::CorruptHistory(_))));
        let err = history
            .append(OperationRecord::new(OpKind::Hide, "/a", false))
            .unwrap_err();
        assert!(matches!(err, Error::CorruptHistory(_)));
        assert_eq!(fs::read_to_string(history.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_schema_field_names() {
        let mut record = OperationRecord::new(OpKind::Sanitize, "/root", true);
        record
            .entries
            .push(MoveEntry::new("/root/a.txt", "/root/documents/001_050124.txt"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["op"], "sanitize");
        assert_eq!(json["path"], "/root");
        assert_eq!(json["recursive"], true);
        assert!(json["timestamp"].is_number());
        assert_eq!(json["entries"][0]["original"], "/root/a.txt");
        assert_eq!(json["entries"][0]["final"], "/root/documents/001_050124.txt");
        assert!(json.get("created_dirs").is_none());
        assert!(json.get("undoes").is_none());
    }

    #[test]
    fn test_reads_legacy_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let history = store(&temp_dir);
        fs::write(
            history.path(),
            r#"[
              {"timestamp": 1700000000.5, "path": "/home/me/pics", "op": "hide", "recursive": true},
              {"timestamp": 1700000100.0, "op": "sanitize", "root": "/home/me/dl",
               "moves": [{"src": "/home/me/dl/a.txt", "dst": "/home/me/dl/txt/a.txt"}]}
            ]"#,
        )
        .unwrap();

        let records = history.all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].recursive);
        assert!(records[0].entries.is_empty());
        assert_eq!(records[1].path, PathBuf::from("/home/me/dl"));
        assert!(!records[1].recursive);
        assert_eq!(
            records[1].entries[0],
            MoveEntry::new("/home/me/dl/a.txt", "/home/me/dl/txt/a.txt")
        );
    }

    #[test]
    fn test_fingerprint_tracks_content_not_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let before = temp_dir.path().join("a.txt");
        fs::write(&before, "same").unwrap();
        let fingerprint = Fingerprint::of(&before).unwrap();
        assert_eq!(fingerprint.len, 4);

        let after = temp_dir.path().join("001_050124.txt");
        fs::rename(&before, &after).unwrap();
        assert_eq!(Fingerprint::of(&after).unwrap(), fingerprint);

        fs::write(&after, "edited afterwards").unwrap();
        assert_ne!(Fingerprint::of(&after).unwrap(), fingerprint);
        assert!(matches!(Fingerprint::of(&before), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_fingerprint_is_optional_in_json() {
        let plain = serde_json::to_value(MoveEntry::new("/a", "/.a")).unwrap();
        assert!(plain.get("fingerprint").is_none());

        let entry: MoveEntry = serde_json::from_str(
            r#"{"original": "/r/a.txt", "final": "/r/001_050124.txt",
                "fingerprint": {"len": 3, "mtime": 1704456000}}"#,
        )
        .unwrap();
        assert_eq!(
            entry.fingerprint,
            Some(Fingerprint {
                len: 3,
                mtime: 1_704_456_000,
                mtime_nanos: 0
            })
        );
    }

    #[test]
    fn test_local_time() {
        let mut record = OperationRecord::new(OpKind::Hide, "/a", false);
        record.timestamp = 1_700_000_000.0;
        let time = record.local_time().unwrap();
        assert_eq!(time.timestamp(), 1_700_000_000);
    }
}

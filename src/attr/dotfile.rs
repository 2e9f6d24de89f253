//! Hiding by dotfile convention: `name` becomes `.name` and back.

use super::{AttrChange, HideBackend};
use crate::error::{Error, Result};
use crate::fs_util;
use std::fs;
use std::path::{Path, PathBuf};

const MARKER: char = '.';

/// Portable backend that renames entries. Works on any platform whose file
/// managers treat dotfiles as hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotfileBackend;

impl DotfileBackend {
    fn file_name(path: &Path) -> Result<&str> {
        path.file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))
    }

    fn require_exists(path: &Path) -> Result<()> {
        fs::symlink_metadata(path)
            .map(|_| ())
            .map_err(|e| Error::from_io(path, e))
    }
}

impl HideBackend for DotfileBackend {
    fn name(&self) -> &'static str {
        "dotfile"
    }

    fn is_hidden(&self, path: &Path) -> Result<bool> {
        Self::require_exists(path)?;
        Ok(Self::file_name(path)?.starts_with(MARKER))
    }

    fn target_path(&self, path: &Path, hidden: bool) -> Result<PathBuf> {
        let name = Self::file_name(path)?;
        let is_hidden = name.starts_with(MARKER);

        if hidden == is_hidden {
            return Ok(path.to_path_buf());
        }
        if hidden {
            return Ok(path.with_file_name(format!("{MARKER}{name}")));
        }

        // Only one marker is removed so seek is the exact inverse of hide.
        let visible = &name[MARKER.len_utf8()..];
        if visible.is_empty() {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }
        Ok(path.with_file_name(visible))
    }

    fn set_hidden(&self, path: &Path, hidden: bool) -> Result<AttrChange> {
        Self::require_exists(path)?;
        let target = self.target_path(path, hidden)?;
        if target == path {
            return Ok(AttrChange::unchanged(path));
        }

        fs_util::rename_no_clobber(path, &target)?;
        tracing::debug!("renamed {} -> {}", path.display(), target.display());
        Ok(AttrChange {
            path: target,
            changed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hide_adds_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("photos");
        fs::create_dir(&dir).unwrap();

        let change = DotfileBackend.set_hidden(&dir, true).unwrap();
        assert!(change.changed);
        assert_eq!(change.path, temp_dir.path().join(".photos"));
        assert!(!dir.exists());
        assert!(DotfileBackend.is_hidden(&change.path).unwrap());
    }

    #[test]
    fn test_hide_twice_is_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join(".secret");
        fs::write(&file, "x").unwrap();

        let change = DotfileBackend.set_hidden(&file, true).unwrap();
        assert!(!change.changed);
        assert_eq!(change.path, file);
    }

    #[test]
    fn test_seek_removes_single_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("..twice");
        fs::write(&file, "x").unwrap();

        let change = DotfileBackend.set_hidden(&file, false).unwrap();
        assert_eq!(change.path, temp_dir.path().join(".twice"));
    }

    #[test]
    fn test_hide_collision() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("notes");
        fs::write(&file, "visible").unwrap();
        fs::write(temp_dir.path().join(".notes"), "hidden").unwrap();

        let err = DotfileBackend.set_hidden(&file, true).unwrap_err();
        assert!(matches!(err, Error::NameCollision(_)));
        assert_eq!(fs::read_to_string(&file).unwrap(), "visible");
    }

    #[test]
    fn test_missing_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let err = DotfileBackend
            .set_hidden(&temp_dir.path().join("nope"), true)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_target_path_does_not_touch_disk() {
        let path = Path::new("/not/there/report");
        assert_eq!(
            DotfileBackend.target_path(path, true).unwrap(),
            PathBuf::from("/not/there/.report")
        );
        assert_eq!(
            DotfileBackend.target_path(path, false).unwrap(),
            PathBuf::from(path)
        );
    }

    #[test]
    fn test_root_has_no_name() {
        let err = DotfileBackend.target_path(Path::new("/"), true).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }
}

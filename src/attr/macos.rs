//! macOS hiding through the `UF_HIDDEN` BSD file flag (what `chflags hidden` sets).

use super::{AttrChange, HideBackend};
use crate::error::{Error, Result};
use std::ffi::CString;
use std::fs;
use std::io;
use std::os::macos::fs::MetadataExt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

// From <sys/stat.h>.
const UF_HIDDEN: u32 = 0x0000_8000;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChflagsBackend;

impl ChflagsBackend {
    fn flags(path: &Path) -> Result<u32> {
        fs::metadata(path)
            .map(|m| m.st_flags())
            .map_err(|e| Error::from_io(path, e))
    }

    fn chflags(path: &Path, flags: u32) -> Result<()> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Error::InvalidPath(path.to_path_buf()))?;
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let ret = unsafe { libc::chflags(c_path.as_ptr(), flags as libc::c_uint) };
        if ret != 0 {
            return Err(Error::from_io(path, io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl HideBackend for ChflagsBackend {
    fn name(&self) -> &'static str {
        "chflags"
    }

    fn is_hidden(&self, path: &Path) -> Result<bool> {
        Ok(Self::flags(path)? & UF_HIDDEN != 0)
    }

    fn target_path(&self, path: &Path, _hidden: bool) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn set_hidden(&self, path: &Path, hidden: bool) -> Result<AttrChange> {
        let current = Self::flags(path)?;
        if (current & UF_HIDDEN != 0) == hidden {
            return Ok(AttrChange::unchanged(path));
        }

        let flags = if hidden {
            current | UF_HIDDEN
        } else {
            current & !UF_HIDDEN
        };
        Self::chflags(path, flags)?;
        tracing::debug!("chflags {:#x} {}", flags, path.display());
        Ok(AttrChange {
            path: path.to_path_buf(),
            changed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_chflags_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("album");
        fs::create_dir(&dir).unwrap();

        let change = ChflagsBackend.set_hidden(&dir, true).unwrap();
        assert!(change.changed);
        assert_eq!(change.path, dir);
        assert!(ChflagsBackend.is_hidden(&dir).unwrap());

        assert!(!ChflagsBackend.set_hidden(&dir, true).unwrap().changed);

        ChflagsBackend.set_hidden(&dir, false).unwrap();
        assert!(!ChflagsBackend.is_hidden(&dir).unwrap());
    }
}

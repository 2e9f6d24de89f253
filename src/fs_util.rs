//! Small filesystem primitives shared by the engines.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// True if something (file, directory or dangling symlink) occupies `path`.
pub fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Whether `path` can be stored in the history, which only holds UTF-8 paths.
pub fn is_recordable(path: &Path) -> bool {
    path.to_str().is_some()
}

/// Renames `from` to `to`, refusing to replace anything already at `to`.
///
/// `fs::rename` silently replaces files on Unix, so the destination is
/// checked first.
pub fn rename_no_clobber(from: &Path, to: &Path) -> Result<()> {
    if !occupied(from) {
        return Err(Error::NotFound(from.to_path_buf()));
    }
    if occupied(to) {
        return Err(Error::NameCollision(to.to_path_buf()));
    }
    fs::rename(from, to).map_err(|e| Error::from_io(from, e))
}

/// Writes `contents` to `path` through a synced temp file and a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = File::create(&temp_path).map_err(|e| Error::from_io(&temp_path, e))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::from_io(&temp_path, e))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::from_io(path, e)
    })
}

/// True if `dir` is a directory with no entries.
pub fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

//! Error types for hidenseek.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while hiding, sanitizing or undoing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Destination already exists: {0}")]
    NameCollision(PathBuf),

    #[error("Entry no longer matches recorded state: {path} ({reason})")]
    StaleState { path: PathBuf, reason: String },

    #[error("History file is unreadable: {0}")]
    CorruptHistory(String),

    #[error("No operation left to undo")]
    NothingToUndo,

    #[error("Path has no usable file name: {0}")]
    InvalidPath(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    /// Classifies an `io::Error` raised while touching `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => Error::NameCollision(path.to_path_buf()),
            _ => Error::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub(crate) fn stale(path: &Path, reason: impl Into<String>) -> Self {
        Error::StaleState {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

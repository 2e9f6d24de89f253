//! Platform hide mechanisms.
//!
//! Each host gets one `HideBackend`, picked once by [`platform_backend`]:
//!
//! - macOS: the `UF_HIDDEN` file flag ([`macos::ChflagsBackend`])
//! - Windows: `FILE_ATTRIBUTE_HIDDEN` ([`win32::AttributeBackend`])
//! - everything else: a leading `.` in the name ([`dotfile::DotfileBackend`])
//!
//! The dotfile backend is the only one that moves entries, so callers must
//! always take the resulting path from [`AttrChange`].

pub mod dotfile;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(windows)]
pub mod win32;

use crate::error::Result;
use std::path::{Path, PathBuf};

pub use dotfile::DotfileBackend;

/// Outcome of a single `set_hidden` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrChange {
    /// Where the entry lives after the call.
    pub path: PathBuf,
    /// False when the entry already had the requested state.
    pub changed: bool,
}

impl AttrChange {
    pub fn unchanged(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            changed: false,
        }
    }
}

/// A mechanism that can mark a filesystem entry hidden or visible.
pub trait HideBackend {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether `path` is currently hidden.
    fn is_hidden(&self, path: &Path) -> Result<bool>;

    /// The path `path` would have once its state is `hidden`.
    ///
    /// Does not touch the filesystem beyond reading metadata.
    fn target_path(&self, path: &Path, hidden: bool) -> Result<PathBuf>;

    /// Puts `path` into the requested state.
    ///
    /// Already being in that state is not an error.
    fn set_hidden(&self, path: &Path, hidden: bool) -> Result<AttrChange>;
}

/// Returns the hide mechanism native to the host platform.
pub fn platform_backend() -> Box<dyn HideBackend> {
    #[cfg(target_os = "macos")]
    {
        Box::new(macos::ChflagsBackend)
    }
    #[cfg(windows)]
    {
        Box::new(win32::AttributeBackend)
    }
    #[cfg(not(any(target_os = "macos", windows)))]
    {
        Box::new(DotfileBackend)
    }
}

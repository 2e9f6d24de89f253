//! Windows hiding through `FILE_ATTRIBUTE_HIDDEN` (what `attrib +h` sets).

use super::{AttrChange, HideBackend};
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::fs::MetadataExt;
use std::path::{Path, PathBuf};
use windows::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_NORMAL,
    FILE_FLAGS_AND_ATTRIBUTES, SetFileAttributesW,
};
use windows::core::PCWSTR;

#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeBackend;

impl AttributeBackend {
    fn attributes(path: &Path) -> Result<u32> {
        fs::metadata(path)
            .map(|m| m.file_attributes())
            .map_err(|e| Error::from_io(path, e))
    }

    fn set_attributes(path: &Path, attributes: u32) -> Result<()> {
        // The directory bit is reported but cannot be set; NORMAL must stand alone.
        let mut attributes = attributes & !FILE_ATTRIBUTE_DIRECTORY.0;
        if attributes == 0 {
            attributes = FILE_ATTRIBUTE_NORMAL.0;
        }

        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        // SAFETY: wide is NUL-terminated and outlives the call.
        unsafe {
            SetFileAttributesW(
                PCWSTR(wide.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(attributes),
            )
        }
        .map_err(|e| Error::from_io(path, io::Error::from(e)))
    }
}

impl HideBackend for AttributeBackend {
    fn name(&self) -> &'static str {
        "attrib"
    }

    fn is_hidden(&self, path: &Path) -> Result<bool> {
        Ok(Self::attributes(path)? & FILE_ATTRIBUTE_HIDDEN.0 != 0)
    }

    fn target_path(&self, path: &Path, _hidden: bool) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn set_hidden(&self, path: &Path, hidden: bool) -> Result<AttrChange> {
        let current = Self::attributes(path)?;
        if (current & FILE_ATTRIBUTE_HIDDEN.0 != 0) == hidden {
            return Ok(AttrChange::unchanged(path));
        }

        let attributes = if hidden {
            current | FILE_ATTRIBUTE_HIDDEN.0
        } else {
            current & !FILE_ATTRIBUTE_HIDDEN.0
        };
        Self::set_attributes(path, attributes)?;
        tracing::debug!("attributes {:#x} {}", attributes, path.display());
        Ok(AttrChange {
            path: path.to_path_buf(),
            changed: true,
        })
    }
}

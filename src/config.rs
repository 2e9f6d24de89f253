//! Persisted user defaults (`~/.hns_config.json`).
//!
//! The engine never reads this file; the CLI loads it once and passes the
//! values in as explicit parameters.

use crate::error::{Error, Result};
use crate::fs_util;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".hns_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path used when a command is given none.
    #[serde(default)]
    pub default_path: Option<String>,
    #[serde(default)]
    pub recursive_global_hide: bool,
    #[serde(default = "default_recursive_seek")]
    pub recursive_global_seek: bool,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_recursive_seek() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_path: None,
            recursive_global_hide: false,
            recursive_global_seek: default_recursive_seek(),
            dry_run: false,
        }
    }
}

impl Config {
    /// `~/.hns_config.json`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Loads the config at `path`, or the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialization failed: {}", e)))?;
        fs_util::write_atomic(path, json.as_bytes())
    }

    /// Recursion default for the given direction.
    pub fn recursive_for(&self, hide: bool) -> bool {
        if hide {
            self.recursive_global_hide
        } else {
            self.recursive_global_seek
        }
    }
}

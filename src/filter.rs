//! Exclusion rules for sanitize runs.
//!
//! Rules live in a TOML file:
//!
//! ```toml
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["**/node_modules/**"]
//! extensions = ["part", "crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Include patterns win over every exclude rule.

use crate::error::{Error, Result};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Local filter file looked up in the working directory.
pub const LOCAL_FILTER_FILE: &str = ".hnsrc.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Sanitize dotfiles too. Off by default.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    #[serde(default)]
    pub include: IncludeRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterConfig {
    /// Loads filter rules.
    ///
    /// Order: `explicit` if given, `./.hnsrc.toml`,
    /// `~/.config/hns/filters.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_FILTER_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Some(config_dir) = dirs::home_dir() {
            let user = config_dir.join(".config").join("hns").join("filters.toml");
            if user.exists() {
                return Self::load_from_file(&user);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read filters {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid filters {}: {}", path.display(), e)))
    }

    pub fn compile(self) -> Result<CompiledFilters> {
        CompiledFilters::new(self.filters)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: false,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|e| Error::Config(format!("invalid glob '{}': {}", p, e))))
        .collect()
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| Error::Config(format!("invalid regex '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            include_patterns: compile_globs(&rules.include.patterns)?,
            exclude_regexes,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        })
    }

    /// Whether a sanitize run may touch `path`.
    ///
    /// `relative` is the path below the sanitize root; globs match against it.
    pub fn should_include(&self, relative: &Path) -> bool {
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches_path(relative)) {
            return true;
        }
        if !self.enable_hidden_files && is_hidden_component(relative) {
            return false;
        }
        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }
        if let Some(ext) = relative.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }
        if self.exclude_patterns.iter().any(|p| p.matches_path(relative)) {
            return false;
        }
        !self.exclude_regexes.iter().any(|r| r.is_match(&file_name))
    }
}

// A dotfile, or anything inside a dot-directory.
fn is_hidden_component(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

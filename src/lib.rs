//! hidenseek - hide folders, sanitize their contents, undo either
//!
//! This library hides and reveals filesystem entries through a per-platform
//! mechanism, renames and sorts the files of a folder, and records every
//! change in an append-only history so each operation can be reversed.

pub mod attr;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod file_category;
pub mod filter;
pub mod fs_util;
pub mod hide_seek;
pub mod history;
pub mod outcome;
pub mod output;
pub mod sanitizer;
pub mod undo;

pub use attr::{DotfileBackend, HideBackend, platform_backend};
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use file_category::{Category, FileMapper};
pub use filter::{CompiledFilters, FilterConfig};
pub use hide_seek::Direction;
pub use history::{Fingerprint, HistoryStore, MoveEntry, OpKind, OperationRecord};
pub use outcome::{DryRunReport, RunOutcome, RunReport, SkippedEntry};
pub use sanitizer::{DateSource, SanitizeOptions, SortMode};
pub use undo::UndoReport;

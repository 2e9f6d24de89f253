//! Command-line interface for `hns`.
//!
//! Parses arguments, merges them with the persisted [`Config`], builds an
//! [`Engine`] and prints results through [`OutputFormatter`].

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::filter::FilterConfig;
use crate::hide_seek::Direction;
use crate::history::HistoryStore;
use crate::output::OutputFormatter;
use crate::sanitizer::{DateSource, SanitizeOptions, SortMode};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "hns",
    version,
    about = "Hide or reveal folders, sanitize their contents, undo either"
)]
pub struct Cli {
    /// History file (default: ~/.hns_history.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub history_file: Option<PathBuf>,

    /// Config file (default: ~/.hns_config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Sanitize filter rules (default: ./.hnsrc.toml, then ~/.config/hns/filters.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub filters: Option<PathBuf>,

    /// Log every entry touched
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Hide a file or folder
    Hide(HideSeekArgs),
    /// Reveal a hidden file or folder
    Seek(HideSeekArgs),
    /// Show whether a path is hidden
    Status {
        path: Option<PathBuf>,
    },
    /// Rename and sort the files of a folder
    Sanitize(SanitizeArgs),
    /// Revert a recorded operation
    Undo {
        /// History index to undo (default: most recent pending)
        #[arg(long)]
        index: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List recorded operations
    History,
    /// Show or change persisted defaults
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct HideSeekArgs {
    pub path: Option<PathBuf>,
    /// Apply to the whole subtree
    #[arg(short, long, conflicts_with = "no_recursive")]
    pub recursive: bool,
    /// Only the path itself
    #[arg(long)]
    pub no_recursive: bool,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct SanitizeArgs {
    pub path: Option<PathBuf>,
    /// Rename files to NNN_DDMMYY.ext
    #[arg(long)]
    pub rename: bool,
    /// Sort into one folder per file type
    #[arg(long)]
    pub sort_type: bool,
    /// Sort into one folder per date (YYYY-MM-DD)
    #[arg(long)]
    pub sort_date: bool,
    /// Include files in subfolders
    #[arg(short, long)]
    pub recursive: bool,
    /// Remove folders left empty
    #[arg(long)]
    pub cleanup: bool,
    /// Rename, sort by type and date, recurse and clean up
    #[arg(long)]
    pub complete: bool,
    /// Date files by creation time instead of modification time
    #[arg(long)]
    pub date_created: bool,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long, value_name = "PATH", conflicts_with = "clear_default_path")]
    pub default_path: Option<String>,
    #[arg(long)]
    pub clear_default_path: bool,
    #[arg(long, value_name = "BOOL")]
    pub recursive_hide: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub recursive_seek: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub dry_run: Option<bool>,
}

impl HideSeekArgs {
    fn recursive(&self, config: &Config, direction: Direction) -> bool {
        if self.recursive {
            true
        } else if self.no_recursive {
            false
        } else {
            config.recursive_for(direction.hidden())
        }
    }
}

impl SanitizeArgs {
    fn options(&self, config: &Config) -> SanitizeOptions {
        let mut options = if self.complete {
            SanitizeOptions::complete()
        } else {
            SanitizeOptions {
                rename: self.rename,
                sort: SortMode::from_flags(self.sort_type, self.sort_date),
                recursive: self.recursive,
                cleanup: self.cleanup,
                ..Default::default()
            }
        };
        options.dry_run = self.dry_run || config.dry_run;
        if self.date_created {
            options.date_source = DateSource::Created;
        }
        options
    }
}

/// Runs a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = resolve(cli.config_file.clone(), Config::default_path(), "config")?;
    let config = Config::load(&config_path)?;
    tracing::debug!("config {} loaded", config_path.display());

    let engine = Engine::with_platform_backend(history_store(&cli)?)
        .with_protected([config_path.clone()]);

    match cli.command {
        Command::Hide(args) => hide_or_seek(&engine, &config, args, Direction::Hide),
        Command::Seek(args) => hide_or_seek(&engine, &config, args, Direction::Seek),
        Command::Status { path } => {
            let path = target_path(path.as_deref(), &config)?;
            OutputFormatter::status(&path, engine.is_hidden(&path)?);
            Ok(())
        }
        Command::Sanitize(args) => {
            let filters = FilterConfig::load(cli.filters.as_deref())?.compile()?;
            let engine = engine.with_filters(filters);

            let path = target_path(args.path.as_deref(), &config)?;
            let options = args.options(&config);
            let spinner = OutputFormatter::spinner(&format!("Sanitizing {}", path.display()));
            let outcome = engine.sanitize(&path, &options);
            spinner.finish_and_clear();
            OutputFormatter::run_summary("Sanitized", &path, &outcome?);
            Ok(())
        }
        Command::Undo { index, dry_run } => {
            let dry_run = dry_run || config.dry_run;
            let report = match index {
                Some(index) => engine.undo_at(index, dry_run)?,
                None => engine.undo_last(dry_run)?,
            };
            OutputFormatter::undo_summary(&report);
            Ok(())
        }
        Command::History => {
            OutputFormatter::history_table(&engine.records()?);
            Ok(())
        }
        Command::Config(args) => configure(&config_path, config, args),
    }
}

fn hide_or_seek(
    engine: &Engine,
    config: &Config,
    args: HideSeekArgs,
    direction: Direction,
) -> Result<()> {
    let path = target_path(args.path.as_deref(), config)?;
    let recursive = args.recursive(config, direction);
    let dry_run = args.dry_run || config.dry_run;
    let verb = match direction {
        Direction::Hide => "Hid",
        Direction::Seek => "Revealed",
    };

    let message = format!("{} {}", direction.op_kind(), path.display());
    let spinner = OutputFormatter::spinner(&message);
    let outcome = engine.hide_or_seek(&path, direction, recursive, dry_run);
    spinner.finish_and_clear();
    OutputFormatter::run_summary(verb, &path, &outcome?);
    Ok(())
}

fn configure(path: &Path, mut config: Config, args: ConfigArgs) -> Result<()> {
    let mut changed = false;
    if let Some(default_path) = args.default_path {
        config.default_path = Some(default_path);
        changed = true;
    }
    if args.clear_default_path {
        config.default_path = None;
        changed = true;
    }
    if let Some(value) = args.recursive_hide {
        config.recursive_global_hide = value;
        changed = true;
    }
    if let Some(value) = args.recursive_seek {
        config.recursive_global_seek = value;
        changed = true;
    }
    if let Some(value) = args.dry_run {
        config.dry_run = value;
        changed = true;
    }

    if changed {
        config.save(path)?;
        OutputFormatter::success(&format!("Saved {}", path.display()));
    }

    OutputFormatter::header("CONFIG");
    OutputFormatter::plain(&format!(
        "default_path          {}",
        config.default_path.as_deref().unwrap_or("(none)")
    ));
    OutputFormatter::plain(&format!(
        "recursive_global_hide {}",
        config.recursive_global_hide
    ));
    OutputFormatter::plain(&format!(
        "recursive_global_seek {}",
        config.recursive_global_seek
    ));
    OutputFormatter::plain(&format!("dry_run               {}", config.dry_run));
    Ok(())
}

/// The explicit path, else the configured default.
fn target_path(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
    match (explicit, config.default_path.as_deref()) {
        (Some(path), _) => Ok(path.to_path_buf()),
        (None, Some(default)) => Ok(PathBuf::from(default)),
        (None, None) => Err(Error::Config(
            "no path given and no default_path configured (see 'hns config --default-path')"
                .to_string(),
        )),
    }
}

fn history_store(cli: &Cli) -> Result<HistoryStore> {
    resolve(
        cli.history_file.clone(),
        HistoryStore::default_path(),
        "history",
    )
    .map(HistoryStore::new)
}

fn resolve(explicit: Option<PathBuf>, default: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    explicit
        .or(default)
        .ok_or_else(|| Error::Config(format!("no home directory; pass --{}-file", what)))
}

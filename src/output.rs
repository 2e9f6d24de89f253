//! Console output for the `hns` binary.
//!
//! All user-facing text goes through [`OutputFormatter`]; diagnostics go
//! through `tracing` instead.

use crate::history::{MoveEntry, OpKind, OperationRecord};
use crate::outcome::{RunOutcome, SkippedEntry};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Manages all CLI output with consistent styling.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Spinner shown while a walk is running.
    ///
    /// ```no_run
    /// use hidenseek::output::OutputFormatter;
    /// let spinner = OutputFormatter::spinner("Hiding ~/Pictures");
    /// spinner.finish_and_clear();
    /// ```
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    }

    /// Summary of a hide, seek or sanitize run.
    pub fn run_summary(verb: &str, path: &Path, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::DryRun(report) => {
                Self::dry_run_notice(&format!("{} {}", verb, path.display()));
                for dir in &report.created_dirs {
                    println!("  {} {}", "mkdir".cyan(), dir.display());
                }
                Self::print_moves(&report.planned, "would change");
                for dir in &report.removed_dirs {
                    println!("  {} {}", "rmdir".cyan(), dir.display());
                }
                Self::print_skipped(&report.skipped);
                Self::dry_run_notice(&format!(
                    "{} change(s) planned, nothing was modified",
                    report.planned.len()
                ));
            }
            RunOutcome::Applied(report) => {
                let record = &report.record;
                Self::print_moves(&record.entries, "changed");
                Self::print_skipped(&report.skipped);

                let mut summary = format!(
                    "{} {}: {} changed, {} unchanged",
                    verb,
                    path.display(),
                    record.entries.len(),
                    report.unchanged.len()
                );
                if !record.created_dirs.is_empty() || !record.removed_dirs.is_empty() {
                    summary.push_str(&format!(
                        ", {} folder(s) created, {} removed",
                        record.created_dirs.len(),
                        record.removed_dirs.len()
                    ));
                }
                if report.skipped.is_empty() {
                    Self::success(&summary);
                } else {
                    Self::warning(&format!("{}, {} skipped", summary, report.skipped.len()));
                }
                if let Some(index) = report.history_index {
                    Self::info(&format!("Recorded as #{}. Run 'hns undo' to revert.", index));
                }
            }
        }
    }

    pub fn undo_summary(report: &UndoReport) {
        if report.dry_run {
            Self::dry_run_notice(&format!(
                "undo {} #{} on {}",
                report.op,
                report.index,
                report.path.display()
            ));
        }
        for dir in &report.recreated_dirs {
            println!("  {} {}", "mkdir".cyan(), dir.display());
        }
        for entry in &report.restored {
            println!(
                "  {} {} {}",
                entry.final_path.display(),
                "→".cyan(),
                entry.original.display()
            );
        }
        for dir in &report.removed_dirs {
            println!("  {} {}", "rmdir".cyan(), dir.display());
        }
        Self::print_skipped(&report.skipped);

        let summary = format!(
            "{} {} #{} on {}: {} entr{} restored",
            if report.dry_run { "Would undo" } else { "Undid" },
            report.op,
            report.index,
            report.path.display(),
            report.restored.len(),
            if report.restored.len() == 1 { "y" } else { "ies" }
        );
        if report.dry_run {
            Self::dry_run_notice(&summary);
        } else {
            Self::success(&summary);
        }
    }

    /// History table, oldest first. Undone records are dimmed.
    pub fn history_table(records: &[OperationRecord]) {
        if records.is_empty() {
            Self::info("No operations recorded yet.");
            return;
        }
        let consumed: HashSet<usize> = records.iter().filter_map(|r| r.undoes).collect();

        Self::header("HISTORY");
        println!(
            "{:>4}  {:<19}  {:<8}  {:<5}  {}",
            "#".bold(),
            "When".bold(),
            "Op".bold(),
            "Rec".bold(),
            "Path".bold()
        );
        println!("{}", "-".repeat(60));

        for (index, record) in records.iter().enumerate() {
            let when = record
                .local_time()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "?".to_string());
            let detail = match (record.op, record.undoes) {
                (OpKind::Undo, Some(target)) => format!("undoes #{}", target),
                _ => format!("{} entr(ies)", record.entries.len()),
            };
            let line = format!(
                "{:>4}  {:<19}  {:<8}  {:<5}  {} ({})",
                index,
                when,
                record.op.as_str(),
                if record.recursive { "yes" } else { "no" },
                record.path.display(),
                detail
            );
            if consumed.contains(&index) {
                println!("{}", line.dimmed());
            } else {
                println!("{}", line);
            }
        }
    }

    pub fn status(path: &Path, hidden: bool) {
        if hidden {
            println!("{} {}", path.display(), "hidden".yellow());
        } else {
            println!("{} {}", path.display(), "visible".green());
        }
    }

    fn print_moves(entries: &[MoveEntry], attr_label: &str) {
        for entry in entries {
            if entry.is_rename() {
                println!(
                    "  {} {} {}",
                    entry.original.display(),
                    "→".cyan(),
                    entry.final_path.display()
                );
            } else {
                println!("  {} ({})", entry.original.display(), attr_label);
            }
        }
    }

    fn print_skipped(skipped: &[SkippedEntry]) {
        for entry in skipped {
            eprintln!("  {} {}: {}", "✗".red(), entry.path.display(), entry.error);
        }
    }
}

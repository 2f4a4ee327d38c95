//! Command-line interface module for autosort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Organization and dry-run reporting
//! - Undo and history listing
//! - Running the scheduler in the foreground
//! - Showing and clearing the activity log

use crate::error::OrganizeError;
use crate::file_category::Category;
use crate::output::OutputFormatter;
use crate::service::OrganizerService;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

/// Sort a folder's files into category subfolders by extension.
#[derive(Parser, Debug)]
#[command(name = "autosort")]
#[command(version)]
#[command(about = "Sort a folder's files into category subfolders by extension", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: OrganizeCommand,
}

/// Represents a CLI command to execute.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Move every file of a folder into its category subfolder
    Organize {
        /// Folder to organize (defaults to the last one used)
        dir: Option<PathBuf>,

        /// Show what would happen without moving anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Undo the most recent organization
    Undo,
    /// List past organizations, newest first
    History,
    /// Organize a folder repeatedly until Enter is pressed
    Schedule {
        /// Folder to organize (defaults to the last one used)
        dir: Option<PathBuf>,

        /// Minutes between runs (defaults to the saved interval)
        #[arg(short, long, allow_hyphen_values = true)]
        minutes: Option<i64>,
    },
    /// Print the activity log
    Log {
        /// Empty the log instead of printing it
        #[arg(long)]
        clear: bool,
    },
    /// List the categories and their extensions
    Categories,
}

/// Runs a command against the service.
///
/// Errors come back as user-facing messages; "nothing to undo" is reported as
/// information, not as a failure.
///
/// # Examples
///
/// ```no_run
/// use autosort::cli::{OrganizeCommand, run_cli};
/// use autosort::config::Settings;
/// use autosort::service::OrganizerService;
///
/// let service = OrganizerService::from_settings(&Settings::default()).unwrap();
/// let command = OrganizeCommand::Organize { dir: Some("/home/me/Downloads".into()), dry_run: false };
/// if let Err(e) = run_cli(command, &service) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, service: &OrganizerService) -> Result<(), String> {
    match command {
        OrganizeCommand::Organize { dir, dry_run } => {
            let dir = resolve_dir(dir, service)?;
            if dry_run {
                organize_dry_run(&dir, service)
            } else {
                organize(&dir, service)
            }
        }
        OrganizeCommand::Undo => undo(service),
        OrganizeCommand::History => {
            show_history(service);
            Ok(())
        }
        OrganizeCommand::Schedule { dir, minutes } => {
            let dir = resolve_dir(dir, service)?;
            let minutes = minutes.unwrap_or_else(|| service.schedule_minutes());
            run_scheduler(&dir, minutes, service)
        }
        OrganizeCommand::Log { clear } => show_or_clear_log(clear, service),
        OrganizeCommand::Categories => {
            show_categories(service);
            Ok(())
        }
    }
}

/// Picks the folder to work on: the argument, else the saved one.
fn resolve_dir(dir: Option<PathBuf>, service: &OrganizerService) -> Result<PathBuf, String> {
    match dir {
        Some(dir) => Ok(dir),
        None => {
            let saved = service.source_path();
            if saved.is_empty() {
                Err("Please select a folder first (pass a directory path)".to_string())
            } else {
                Ok(PathBuf::from(saved))
            }
        }
    }
}

fn organize(dir: &std::path::Path, service: &OrganizerService) -> Result<(), String> {
    OutputFormatter::info(&format!("Organizing contents of: {}", dir.display()));

    let mut progress = OutputFormatter::create_progress_bar();
    let result = service.organize_with_progress(dir, &mut progress);
    progress.finish("");
    let result = result.map_err(|e| e.to_string())?;
    service.set_source_path(dir).map_err(|e| e.to_string())?;

    if result.total_files == 0 {
        OutputFormatter::info("No files found to organize");
        return Ok(());
    }

    OutputFormatter::success(&format!(
        "Organized {} of {} files",
        result.moved_count, result.total_files
    ));
    if result.failed_count > 0 {
        OutputFormatter::warning(&format!(
            "{} files could not be moved. Run 'autosort log' for details.",
            result.failed_count
        ));
    }
    if result.moved_count > 0 {
        OutputFormatter::plain("Use 'autosort undo' to revert these changes.");
    }
    Ok(())
}

fn organize_dry_run(dir: &std::path::Path, service: &OrganizerService) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir.display()));
    let plan = service.preview(dir).map_err(|e| e.to_string())?;

    if plan.is_empty() {
        OutputFormatter::info("No files found to organize");
        return Ok(());
    }

    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for planned in &plan {
        OutputFormatter::plain(&format!(
            " - {}\n   → Would move to {}/",
            planned.filename, planned.category
        ));
        *category_counts
            .entry(planned.category.to_string())
            .or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&category_counts, plan.len());
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn undo(service: &OrganizerService) -> Result<(), String> {
    OutputFormatter::info("Undoing last organization...");

    let mut progress = OutputFormatter::create_progress_bar();
    let result = service.undo_last_with_progress(&mut progress);
    progress.finish("");

    match result {
        Ok(report) => {
            OutputFormatter::success(&format!(
                "Undo complete: restored {} of {} files",
                report.restored_count, report.total_operations
            ));
            if !report.skipped.is_empty() {
                OutputFormatter::plain(&format!(
                    "  Skipped (no longer in place): {}",
                    report.skipped.len()
                ));
            }
            for (path, reason) in &report.failed {
                OutputFormatter::error(&format!("{}: {}", path.display(), reason));
            }
            Ok(())
        }
        Err(OrganizeError::EmptyHistory) => {
            OutputFormatter::info("No organization history to undo");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn show_history(service: &OrganizerService) {
    let history = service.history();
    if history.is_empty() {
        OutputFormatter::info("No organization history yet.");
        return;
    }

    OutputFormatter::header("Organization History");
    for batch in history.iter().rev() {
        OutputFormatter::plain(&batch.describe());
    }
}

fn run_scheduler(
    dir: &std::path::Path,
    minutes: i64,
    service: &OrganizerService,
) -> Result<(), String> {
    service
        .start_scheduler(minutes, dir)
        .map_err(|e| e.to_string())?;
    OutputFormatter::success(&format!(
        "Scheduler running every {} minutes on {}",
        minutes,
        dir.display()
    ));
    OutputFormatter::plain("Press Enter to stop.");

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line);
    service.stop_scheduler();
    read.map_err(|e| format!("Could not read from terminal: {}", e))?;

    OutputFormatter::info("Scheduler is not running");
    Ok(())
}

fn show_or_clear_log(clear: bool, service: &OrganizerService) -> Result<(), String> {
    if clear {
        service.clear_log().map_err(|e| e.to_string())?;
        OutputFormatter::success("Log cleared");
        return Ok(());
    }

    let text = service.log_text().map_err(|e| e.to_string())?;
    if text.is_empty() {
        OutputFormatter::info("No log file found yet.");
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn show_categories(service: &OrganizerService) {
    OutputFormatter::header("File Categories");
    for (category, extensions) in service.mapper().categories() {
        let listed = if category == Category::Others {
            "(everything else)".to_string()
        } else {
            extensions.join(", ")
        };
        OutputFormatter::plain(&format!("{:<12} {}", format!("{}:", category), listed));
    }
}

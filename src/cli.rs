//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Organization orchestration (real runs and dry runs)
//! - Undo log persistence and undo handling

use crate::config::FilterConfig;
use crate::organizer::{OrganizeMode, Organizer, RunContext};
use crate::output::OutputFormatter;
use crate::placer::TransferMode;
use crate::undo::{UndoLog, UndoManager, UndoRecord, UndoReport};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Organize the files of a directory by extension or modification date.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Args {
    /// Source directory to organize.
    #[arg(long, value_name = "DIR", required_unless_present = "undo")]
    pub src: Option<PathBuf>,

    /// Grouping mode.
    #[arg(long, value_enum, default_value_t = OrganizeMode::Extension)]
    pub mode: OrganizeMode,

    /// Copy files instead of moving them.
    #[arg(long)]
    pub copy: bool,

    /// Preview the placements without touching anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Undo a previous run from its log file; other organize options are ignored.
    #[arg(long, value_name = "LOGFILE")]
    pub undo: Option<PathBuf>,

    /// Filter configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic logging (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Resolves the parsed arguments into the command to run.
    pub fn command(&self) -> Result<OrganizeCommand> {
        if let Some(log) = &self.undo {
            return Ok(OrganizeCommand::Undo { log: log.clone() });
        }

        let src = self
            .src
            .clone()
            .ok_or_else(|| anyhow!("--src is required unless --undo is given"))?;

        Ok(OrganizeCommand::Organize {
            src,
            mode: self.mode,
            transfer: if self.copy {
                TransferMode::Copy
            } else {
                TransferMode::Move
            },
            dry_run: self.dry_run,
        })
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Organize the files of a directory.
    Organize {
        src: PathBuf,
        mode: OrganizeMode,
        transfer: TransferMode,
        /// If true, simulate the operation without making changes.
        dry_run: bool,
    },
    /// Undo a previous run from its log.
    Undo { log: PathBuf },
}

/// What an organize run did.
#[derive(Debug)]
pub struct OrganizeReport {
    /// One record per file, in processing order.
    pub records: Vec<UndoRecord>,
    /// Where the undo log was written; `None` for dry runs.
    pub log_path: Option<PathBuf>,
}

/// Runs the given command.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::{run_cli, OrganizeCommand};
/// use dirsort::organizer::OrganizeMode;
/// use dirsort::placer::TransferMode;
/// use std::path::PathBuf;
///
/// let command = OrganizeCommand::Organize {
///     src: PathBuf::from("/data/inbox"),
///     mode: OrganizeMode::Extension,
///     transfer: TransferMode::Move,
///     dry_run: true,
/// };
/// if let Err(e) = run_cli(command, None) {
///     eprintln!("Error: {:#}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, config_path: Option<&Path>) -> Result<()> {
    match command {
        OrganizeCommand::Organize {
            src,
            mode,
            transfer,
            dry_run,
        } => {
            let context = RunContext::new(transfer, dry_run);
            organize_directory(&src, mode, &context, config_path).map(|_| ())
        }
        OrganizeCommand::Undo { log } => undo_from_log(&log).map(|_| ()),
    }
}

/// Organizes `src` with the given mode and run context.
///
/// This function:
/// 1. Loads and compiles the filter configuration
/// 2. Scans the regular files of `src`
/// 3. Places each file (or previews it on a dry run)
/// 4. Writes the undo log, unless this is a dry run
///
/// A filesystem error aborts the run and no log is written.
pub fn organize_directory(
    src: &Path,
    mode: OrganizeMode,
    context: &RunContext,
    config_path: Option<&Path>,
) -> Result<OrganizeReport> {
    let filters = FilterConfig::load(config_path)
        .context("Error loading configuration")?
        .compile()
        .context("Error compiling filters")?;

    let organizer = Organizer::new(src, context)?.with_filters(&filters);
    let dry_run = context.dry_run;

    if dry_run {
        OutputFormatter::info(&format!(
            "DRY RUN: Analyzing contents of: {}",
            organizer.src().display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Organizing contents of: {}",
            organizer.src().display()
        ));
    }

    let entries = organizer.scan()?;
    if entries.is_empty() {
        OutputFormatter::info("No files found to organize.");
    }

    let pb = if dry_run {
        ProgressBar::hidden()
    } else {
        OutputFormatter::create_progress_bar(entries.len() as u64)
    };

    let result = organizer.organize_entries(&entries, mode, |record| {
        pb.suspend(|| {
            if dry_run {
                OutputFormatter::dry_run_notice(&record.original, &record.moved);
            } else {
                println!(
                    " - {}",
                    OutputFormatter::placement_line(&record.original, &record.moved)
                );
            }
        });
        pb.inc(1);
    });

    let records = match result {
        Ok(records) => {
            pb.finish_and_clear();
            records
        }
        Err(e) => {
            pb.abandon();
            return Err(e).context("Organizing aborted; no undo log was written");
        }
    };

    if !records.is_empty() {
        OutputFormatter::summary_table(&folder_counts(organizer.src(), &records));
    }

    if dry_run {
        OutputFormatter::success("Dry run completed. No files were moved.");
        return Ok(OrganizeReport {
            records,
            log_path: None,
        });
    }

    let log = UndoLog::new(records);
    let log_path = log.write(organizer.src(), &context.started_at)?;
    OutputFormatter::success(&format!("Undo log saved: {}", log_path.display()));

    Ok(OrganizeReport {
        records: log.records,
        log_path: Some(log_path),
    })
}

/// Undoes the run recorded in `log_path`.
///
/// Originals that are already occupied are reported as warnings; moved files
/// that disappeared are skipped silently.
pub fn undo_from_log(log_path: &Path) -> Result<UndoReport> {
    OutputFormatter::info(&format!("Undoing run from: {}", log_path.display()));

    let report = UndoManager::undo(log_path)
        .with_context(|| format!("Undo from {} failed", log_path.display()))?;

    for original in &report.skipped_occupied {
        OutputFormatter::warning(&format!(
            "Skip restoring {}, already exists.",
            original.display()
        ));
    }

    OutputFormatter::success("Undo completed.");
    println!("  Restored: {}", report.restored.len());
    let skipped = report.skipped_missing.len() + report.skipped_occupied.len();
    if skipped > 0 {
        println!("  Skipped: {}", skipped);
    }

    Ok(report)
}

/// Counts records per target folder, relative to `src`.
fn folder_counts(src: &Path, records: &[UndoRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let folder = record
            .moved
            .parent()
            .map(|parent| parent.strip_prefix(src).unwrap_or(parent))
            .map(|relative| relative.display().to_string())
            .unwrap_or_default();
        *counts.entry(folder).or_insert(0) += 1;
    }
    counts
}

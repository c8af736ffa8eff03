/// Undo logs and their reversal.
///
/// A run records one [`UndoRecord`] per placed file. The records are written
/// once, at the end of a real run, as a JSON array next to the organized files.
/// [`UndoManager::undo`] later moves every file back to where it came from.
use crate::error::{OrganizeError, OrganizeResult};
use crate::placer::Placer;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Format of the timestamp embedded in undo log names.
const LOG_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One relocated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    /// Absolute path of the file before the run.
    pub original: PathBuf,
    /// Absolute path the file was placed at.
    pub moved: PathBuf,
}

impl UndoRecord {
    pub fn new(original: PathBuf, moved: PathBuf) -> Self {
        Self { original, moved }
    }
}

/// The ordered records of a single run, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoLog {
    pub records: Vec<UndoRecord>,
}

impl UndoLog {
    pub fn new(records: Vec<UndoRecord>) -> Self {
        Self { records }
    }

    /// Returns the log file name for a run started at `started_at`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Local, TimeZone};
    /// use dirsort::undo::UndoLog;
    ///
    /// let started = Local.with_ymd_and_hms(2024, 5, 1, 8, 30, 5).unwrap();
    /// assert_eq!(UndoLog::file_name(&started), "undo_20240501_083005.json");
    /// ```
    pub fn file_name(started_at: &DateTime<Local>) -> String {
        format!("undo_{}.json", started_at.format(LOG_TIMESTAMP_FORMAT))
    }

    /// Writes the log into `dir` and returns its absolute path.
    ///
    /// The JSON is pretty-printed with two-space indentation and keeps the
    /// record order.
    pub fn write(&self, dir: &Path, started_at: &DateTime<Local>) -> OrganizeResult<PathBuf> {
        let path = dir.join(Self::file_name(started_at));
        let path = std::path::absolute(&path).map_err(|e| OrganizeError::LogWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            OrganizeError::LogWriteFailed {
                path: path.clone(),
                source: e.into(),
            }
        })?;

        fs::write(&path, json).map_err(|e| OrganizeError::LogWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), records = self.records.len(), "wrote undo log");
        Ok(path)
    }

    /// Reads and parses a log written by [`UndoLog::write`].
    pub fn load(path: &Path) -> OrganizeResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| OrganizeError::LogReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&json).map_err(|e| OrganizeError::InvalidLogFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Outcome of restoring a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The file was moved back to its original path.
    Restored,
    /// Nothing exists at the moved path any more.
    MovedMissing,
    /// Something already occupies the original path.
    OriginalOccupied,
}

/// Summary of an undo run.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Original paths that were restored.
    pub restored: Vec<PathBuf>,
    /// Moved paths that no longer existed.
    pub skipped_missing: Vec<PathBuf>,
    /// Original paths that were already occupied.
    pub skipped_occupied: Vec<PathBuf>,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored.len() + self.skipped_missing.len() + self.skipped_occupied.len()
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.skipped_missing.is_empty() && self.skipped_occupied.is_empty()
    }
}

/// Reverses earlier runs from their undo logs.
pub struct UndoManager;

impl UndoManager {
    /// Moves every file listed in the log at `log_path` back to its original path.
    ///
    /// The log is parsed in full before anything is touched. Records are then
    /// processed in log order:
    ///
    /// * **Moved path missing**: skipped silently
    /// * **Original path occupied**: skipped, never overwritten
    /// * **Otherwise**: missing parent folders are created and the file is moved back
    ///
    /// Files are always moved back, even when the run copied them. The log file
    /// itself is left untouched, so running the same undo twice is harmless.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/data/inbox/undo_20240501_083005.json")) {
    ///     Ok(report) => println!("Restored {} files", report.restored.len()),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(log_path: &Path) -> OrganizeResult<UndoReport> {
        let log = UndoLog::load(log_path)?;

        let mut report = UndoReport::default();
        for record in &log.records {
            match Self::restore_record(record)? {
                RestoreOutcome::Restored => report.restored.push(record.original.clone()),
                RestoreOutcome::MovedMissing => report.skipped_missing.push(record.moved.clone()),
                RestoreOutcome::OriginalOccupied => {
                    report.skipped_occupied.push(record.original.clone())
                }
            }
        }

        info!(
            log = %log_path.display(),
            restored = report.restored.len(),
            skipped = report.total_processed() - report.restored.len(),
            "undo finished"
        );

        Ok(report)
    }

    /// Restores a single record.
    pub fn restore_record(record: &UndoRecord) -> OrganizeResult<RestoreOutcome> {
        if record.moved.symlink_metadata().is_err() {
            debug!(moved = %record.moved.display(), "moved file is gone, skipping");
            return Ok(RestoreOutcome::MovedMissing);
        }

        if record.original.symlink_metadata().is_ok() {
            debug!(original = %record.original.display(), "original path occupied, skipping");
            return Ok(RestoreOutcome::OriginalOccupied);
        }

        if let Some(parent) = record.original.parent() {
            fs::create_dir_all(parent).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        Placer::move_file(&record.moved, &record.original)?;
        debug!(
            moved = %record.moved.display(),
            original = %record.original.display(),
            "restored file"
        );

        Ok(RestoreOutcome::Restored)
    }
}

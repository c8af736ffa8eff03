//! Error types shared by the placer, organizer and undo modules.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while organizing a directory or undoing a run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source directory is missing or is not a directory.
    #[error("Invalid source directory {path}")]
    InvalidSourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing the source directory failed.
    #[error("Failed to read directory {path}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the metadata of a scanned file failed.
    #[error("Failed to read metadata of {path}")]
    MetadataFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a target directory.
    #[error("Failed to create directory {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a file.
    #[error("Failed to move {from} to {to}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to copy a file.
    #[error("Failed to copy {from} to {to}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write the undo log.
    #[error("Failed to write undo log {path}")]
    LogWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the undo log.
    #[error("Failed to read undo log {path}")]
    LogReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The undo log is not a JSON array of `{original, moved}` objects.
    #[error("Invalid undo log {path}: {reason}")]
    InvalidLogFormat { path: PathBuf, reason: String },
}

impl OrganizeError {
    /// Creates a move failure error.
    pub fn move_failed(from: &Path, to: &Path, error: std::io::Error) -> Self {
        Self::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error,
        }
    }

    /// Creates a copy failure error.
    pub fn copy_failed(from: &Path, to: &Path, error: std::io::Error) -> Self {
        Self::CopyFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            error,
        }
    }
}

/// Result type for organize and undo operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

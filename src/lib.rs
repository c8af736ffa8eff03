//! dirsort - sort the files of a directory into subfolders
//!
//! This library groups the regular files of a single directory by extension
//! or by modification date, places them without ever overwriting anything,
//! and records every placement in an undo log that can later be reversed.

pub mod cli;
pub mod config;
pub mod error;
pub mod organizer;
pub mod output;
pub mod placer;
pub mod undo;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use error::{OrganizeError, OrganizeResult};
pub use organizer::{FileEntry, OrganizeMode, Organizer, RunContext};
pub use placer::{Placer, TransferMode};
pub use undo::{UndoLog, UndoManager, UndoRecord, UndoReport};

pub use cli::{OrganizeCommand, run_cli};

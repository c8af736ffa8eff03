/// Directory organization by extension or by modification date.
///
/// This module scans the immediate children of a source directory, decides a
/// target folder for every regular file and routes each one through the
/// [`Placer`]. Every placement yields an [`UndoRecord`].
use crate::config::CompiledFilters;
use crate::error::{OrganizeError, OrganizeResult};
use crate::placer::{Placer, TransferMode, split_file_name};
use crate::undo::UndoRecord;
use chrono::{DateTime, Datelike, Local};
use clap::ValueEnum;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Folder label for files without an extension, before upper-casing.
pub const NO_EXTENSION: &str = "noext";

/// How files are grouped into subfolders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OrganizeMode {
    /// One folder per upper-cased extension, e.g. `PDF/`.
    #[default]
    #[value(name = "ext")]
    Extension,
    /// Nested `YEAR/MONTH/` folders from the modification time.
    #[value(name = "date")]
    Date,
}

/// Settings captured once at the start of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Start of the run; names the undo log.
    pub started_at: DateTime<Local>,
    pub transfer: TransferMode,
    /// Compute placements without touching the filesystem.
    pub dry_run: bool,
}

impl RunContext {
    /// Creates a context stamped with the current local time.
    pub fn new(transfer: TransferMode, dry_run: bool) -> Self {
        Self::with_start_time(Local::now(), transfer, dry_run)
    }

    /// Creates a context with an explicit start time.
    pub fn with_start_time(
        started_at: DateTime<Local>,
        transfer: TransferMode,
        dry_run: bool,
    ) -> Self {
        Self {
            started_at,
            transfer,
            dry_run,
        }
    }
}

/// A regular file found in the source directory at scan time.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// The file name.
    pub name: String,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Last modification time, in local time.
    pub modified: DateTime<Local>,
}

/// Returns the folder name for a file under [`OrganizeMode::Extension`].
///
/// The extension is lower-cased, then the folder name is its upper-cased form;
/// files without one go to `NOEXT`.
///
/// # Examples
///
/// ```
/// use dirsort::organizer::extension_folder;
///
/// assert_eq!(extension_folder("report.PDF"), "PDF");
/// assert_eq!(extension_folder("README"), "NOEXT");
/// ```
pub fn extension_folder(file_name: &str) -> String {
    let (_, ext) = split_file_name(file_name);
    let ext = ext.strip_prefix('.').unwrap_or(ext).to_lowercase();
    if ext.is_empty() {
        NO_EXTENSION.to_uppercase()
    } else {
        ext.to_uppercase()
    }
}

/// Returns the relative `YEAR/MONTH` folder for a modification time.
pub fn date_folder(modified: &DateTime<Local>) -> PathBuf {
    Path::new(&format!("{:04}", modified.year())).join(format!("{:02}", modified.month()))
}

/// Organizes the files of one directory.
pub struct Organizer<'a> {
    src: PathBuf,
    context: &'a RunContext,
    filters: Option<&'a CompiledFilters>,
}

impl<'a> Organizer<'a> {
    /// Creates an organizer for `src`, resolved to an absolute path.
    ///
    /// Fails if `src` does not exist, is not a directory, or has a path that
    /// is not valid UTF-8 (the undo log could not record it).
    pub fn new(src: &Path, context: &'a RunContext) -> OrganizeResult<Self> {
        let src = fs::canonicalize(src).map_err(|e| OrganizeError::InvalidSourceDir {
            path: src.to_path_buf(),
            source: e,
        })?;

        if !src.is_dir() {
            return Err(OrganizeError::InvalidSourceDir {
                path: src,
                source: std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
            });
        }

        if src.to_str().is_none() {
            return Err(OrganizeError::InvalidSourceDir {
                path: src,
                source: std::io::Error::new(ErrorKind::InvalidData, "path is not valid UTF-8"),
            });
        }

        Ok(Self {
            src,
            context,
            filters: None,
        })
    }

    /// Restricts the scan to files accepted by `filters`.
    pub fn with_filters(mut self, filters: &'a CompiledFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// The absolute source directory.
    pub fn src(&self) -> &Path {
        &self.src
    }

    /// Lists the regular files directly inside the source directory, sorted by name.
    ///
    /// Subdirectories, special files and dangling symlinks are skipped; symlinks
    /// to regular files are kept. Names that are not valid UTF-8 are skipped
    /// because the undo log cannot represent them.
    pub fn scan(&self) -> OrganizeResult<Vec<FileEntry>> {
        let entries = fs::read_dir(&self.src).map_err(|e| OrganizeError::ReadDirFailed {
            path: self.src.clone(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OrganizeError::ReadDirFailed {
                path: self.src.clone(),
                source: e,
            })?;
            let path = entry.path();

            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(OrganizeError::MetadataFailed { path, source: e }),
            };
            if !metadata.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %path.display(), "skipping file with a non UTF-8 name");
                continue;
            };

            if let Some(filters) = self.filters
                && !filters.should_include(&name)
            {
                debug!(file = %name, "excluded by filters");
                continue;
            }

            let modified = metadata
                .modified()
                .map_err(|e| OrganizeError::MetadataFailed {
                    path: path.clone(),
                    source: e,
                })?;

            files.push(FileEntry {
                name,
                path,
                modified: DateTime::<Local>::from(modified),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Groups files into upper-cased extension folders.
    pub fn organize_by_extension(&self) -> OrganizeResult<Vec<UndoRecord>> {
        self.organize(OrganizeMode::Extension)
    }

    /// Groups files into `YEAR/MONTH` folders by modification time.
    pub fn organize_by_date(&self) -> OrganizeResult<Vec<UndoRecord>> {
        self.organize(OrganizeMode::Date)
    }

    /// Organizes the directory with the given mode.
    pub fn organize(&self, mode: OrganizeMode) -> OrganizeResult<Vec<UndoRecord>> {
        let entries = self.scan()?;
        self.organize_entries(&entries, mode, |_| {})
    }

    /// Organizes already scanned entries, calling `on_record` after each file.
    ///
    /// In dry-run mode nothing is created or moved and each record holds the
    /// undisambiguated target path. Otherwise the target folder is created and
    /// the record holds the real final path. The first filesystem error aborts
    /// the run.
    pub fn organize_entries<F>(
        &self,
        entries: &[FileEntry],
        mode: OrganizeMode,
        mut on_record: F,
    ) -> OrganizeResult<Vec<UndoRecord>>
    where
        F: FnMut(&UndoRecord),
    {
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            let target_dir = self.src.join(self.folder_for(entry, mode));

            let moved = if self.context.dry_run {
                target_dir.join(&entry.name)
            } else {
                fs::create_dir_all(&target_dir).map_err(|e| {
                    OrganizeError::DirectoryCreationFailed {
                        path: target_dir.clone(),
                        source: e,
                    }
                })?;
                Placer::place(&entry.path, &target_dir, &entry.name, self.context.transfer)?
            };

            let record = UndoRecord::new(entry.path.clone(), moved);
            on_record(&record);
            records.push(record);
        }

        info!(
            src = %self.src.display(),
            ?mode,
            files = records.len(),
            dry_run = self.context.dry_run,
            "organized directory"
        );

        Ok(records)
    }

    /// Target folder of `entry`, relative to the source directory.
    pub fn folder_for(&self, entry: &FileEntry, mode: OrganizeMode) -> PathBuf {
        match mode {
            OrganizeMode::Extension => PathBuf::from(extension_folder(&entry.name)),
            OrganizeMode::Date => date_folder(&entry.modified),
        }
    }
}

/// Collision-safe file placement.
///
/// This module decides the final path of a file inside a target directory,
/// appending a numeric suffix when the name is already taken, and then moves
/// or copies the file there.
use crate::error::{OrganizeError, OrganizeResult};
use filetime::FileTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raw `EXDEV` code reported by Linux when a rename crosses filesystems.
const EXDEV: i32 = 18;

/// Whether a failed `rename` must be retried as copy and delete.
fn is_cross_device(error: &std::io::Error) -> bool {
    error.kind() == ErrorKind::CrossesDevices || error.raw_os_error() == Some(EXDEV)
}

/// How a file reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Relocate the file, removing it from its source path.
    #[default]
    Move,
    /// Duplicate the file, leaving the source untouched.
    Copy,
}

/// Splits a file name into its base and extension (the extension keeps its dot).
///
/// Leading dots do not start an extension, so `.bashrc` has none.
///
/// # Examples
///
/// ```
/// use dirsort::placer::split_file_name;
///
/// assert_eq!(split_file_name("report.PDF"), ("report", ".PDF"));
/// assert_eq!(split_file_name("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_file_name(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_file_name("README"), ("README", ""));
/// ```
pub fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if file_name[..idx].chars().any(|c| c != '.') => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Places files into target directories without overwriting anything.
pub struct Placer;

impl Placer {
    /// Returns the first free path for `file_name` inside `target_dir`.
    ///
    /// The candidate is `target_dir/file_name`; while it is taken, the candidate
    /// becomes `target_dir/<base>_<n><ext>` with `n` counting up from 1.
    pub fn resolve_destination(target_dir: &Path, file_name: &str) -> PathBuf {
        let (base, ext) = split_file_name(file_name);
        let mut candidate = target_dir.join(file_name);
        let mut counter = 1u32;

        while candidate.symlink_metadata().is_ok() {
            candidate = target_dir.join(format!("{}_{}{}", base, counter, ext));
            counter += 1;
        }

        candidate
    }

    /// Places `source` into `target_dir` under `file_name` and returns the final path.
    ///
    /// The target directory must already exist. Filesystem errors are returned
    /// as-is; nothing is retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::placer::{Placer, TransferMode};
    /// use std::path::Path;
    ///
    /// let placed = Placer::place(
    ///     Path::new("/data/inbox/photo.png"),
    ///     Path::new("/data/inbox/PNG"),
    ///     "photo.png",
    ///     TransferMode::Move,
    /// );
    /// match placed {
    ///     Ok(path) => println!("Placed at {}", path.display()),
    ///     Err(e) => eprintln!("Placement failed: {}", e),
    /// }
    /// ```
    pub fn place(
        source: &Path,
        target_dir: &Path,
        file_name: &str,
        mode: TransferMode,
    ) -> OrganizeResult<PathBuf> {
        let destination = Self::resolve_destination(target_dir, file_name);

        match mode {
            TransferMode::Copy => Self::copy_file(source, &destination)?,
            TransferMode::Move => Self::move_file(source, &destination)?,
        }

        debug!(
            source = %source.display(),
            destination = %destination.display(),
            ?mode,
            "placed file"
        );

        Ok(destination)
    }

    /// Moves a file, falling back to copy and delete across filesystems.
    pub fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                debug!(
                    source = %source.display(),
                    "rename crosses filesystems, copying instead"
                );
                Self::copy_then_remove(source, destination)
            }
            Err(e) => Err(OrganizeError::move_failed(source, destination, e)),
        }
    }

    /// Moves a file without `rename`: copy with timestamps, then delete the source.
    pub fn copy_then_remove(source: &Path, destination: &Path) -> OrganizeResult<()> {
        Self::copy_file(source, destination)?;
        fs::remove_file(source).map_err(|e| OrganizeError::move_failed(source, destination, e))
    }

    /// Copies a file's content and permissions, then carries over its timestamps.
    pub fn copy_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
        fs::copy(source, destination)
            .map_err(|e| OrganizeError::copy_failed(source, destination, e))?;

        let metadata =
            fs::metadata(source).map_err(|e| OrganizeError::copy_failed(source, destination, e))?;
        filetime::set_file_times(
            destination,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )
        .map_err(|e| OrganizeError::copy_failed(source, destination, e))?;

        Ok(())
    }
}

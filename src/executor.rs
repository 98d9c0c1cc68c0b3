//! Copies a job's source into a timestamped entry under its destination.

use crate::error::BackupError;
use crate::path::base_name;
use chrono::{DateTime, Local};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Second-resolution token appended to the backup entry name.
pub const ENTRY_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Performs the copy for one backup run.
///
/// Both paths must already have been confirmed to exist. Returns the path of
/// the created backup entry.
pub fn execute(source: &Path, destination: &Path) -> Result<PathBuf, BackupError> {
    execute_at(source, destination, Local::now())
}

/// Same as [`execute`] with an explicit instant for the entry name.
pub fn execute_at(
    source: &Path,
    destination: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, BackupError> {
    let target = entry_path(source, destination, now)?;
    let metadata = fs::metadata(source).map_err(|_| BackupError::InvalidSourceType)?;

    if metadata.is_file() {
        debug!(source = %source.display(), target = %target.display(), "Copying file");
        copy_file(source, &target, &metadata)?;
    } else if metadata.is_dir() {
        debug!(source = %source.display(), target = %target.display(), "Copying directory");
        copy_dir(source, &target)?;
    } else {
        return Err(BackupError::InvalidSourceType);
    }
    Ok(target)
}

/// Builds `<destination>/<basename(source)>-<YYYYMMDD-HHMMSS>`.
pub fn entry_path(
    source: &Path,
    destination: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, BackupError> {
    let name = base_name(source).ok_or(BackupError::InvalidSourceType)?;
    let timestamp = now.format(ENTRY_TIMESTAMP_FORMAT);
    Ok(destination.join(format!("{name}-{timestamp}")))
}

/// Copies file contents, permission bits and access/modification times.
fn copy_file(source: &Path, target: &Path, metadata: &Metadata) -> Result<(), BackupError> {
    fs::copy(source, target).map_err(|e| BackupError::copy_io(target, e))?;
    copy_times(target, metadata)
}

/// Recursively copies `source` into the new directory `target`.
///
/// Fails if `target` already exists. Symlinks are followed and their content
/// copied; a dangling link aborts the copy. When `target` lies inside
/// `source` it is left out of the walk.
fn copy_dir(source: &Path, target: &Path) -> Result<(), BackupError> {
    if target.symlink_metadata().is_ok() {
        return Err(BackupError::DestinationAlreadyExists(target.to_path_buf()));
    }
    let nested = nested_target(source, target);

    // Directory metadata is applied once their contents are in place,
    // otherwise writing children would reset the copied times.
    let mut created_dirs = vec![];

    let walker = WalkDir::new(source)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| nested.as_deref() != Some(e.path()));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            BackupError::copy_io(path, e.into())
        })?;
        let path = entry.path();
        let rel = path.strip_prefix(source).unwrap_or(path);
        let dest = target.join(rel);
        let metadata = entry
            .metadata()
            .map_err(|e| BackupError::copy_io(path, e.into()))?;

        if metadata.is_dir() {
            fs::create_dir(&dest).map_err(|e| BackupError::copy_io(&dest, e))?;
            created_dirs.push((dest, metadata));
        } else if metadata.is_file() {
            copy_file(path, &dest, &metadata)?;
        } else {
            debug!(path = %path.display(), "Skipping special file");
        }
    }

    for (dest, metadata) in created_dirs.iter().rev() {
        fs::set_permissions(dest, metadata.permissions())
            .map_err(|e| BackupError::copy_io(dest, e))?;
        copy_times(dest, metadata)?;
    }
    Ok(())
}

/// Returns where `target` shows up in a walk of `source`, if it is inside it.
fn nested_target(source: &Path, target: &Path) -> Option<PathBuf> {
    let source_abs = source.canonicalize().ok()?;
    let target_abs = target.parent()?.canonicalize().ok()?.join(target.file_name()?);
    let rel = target_abs.strip_prefix(&source_abs).ok()?;
    Some(source.join(rel))
}

fn copy_times(target: &Path, metadata: &Metadata) -> Result<(), BackupError> {
    let atime = filetime::FileTime::from_last_access_time(metadata);
    let mtime = filetime::FileTime::from_last_modification_time(metadata);
    filetime::set_file_times(target, atime, mtime).map_err(|e| BackupError::copy_io(target, e))
}

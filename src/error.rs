//! Failure kinds of a backup run.
//!
//! The `Display` text of each variant is the detail written to the log
//! target and mailed in the failure alert.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can make a backup run fail.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Wrong number of command-line arguments.
    #[error("No backup job name provided")]
    NoJobName,

    #[error("Backup job '{0}' not found in configuration")]
    JobNotFound(String),

    #[error("Source path does not exist")]
    SourceMissing,

    #[error("Destination path does not exist")]
    DestinationMissing,

    /// The source is neither a regular file nor a directory, or vanished
    /// between validation and copy.
    #[error("Source path is not a file or directory")]
    InvalidSourceType,

    #[error("{source}: '{}'", .path.display())]
    CopyIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination already exists: '{}'", .0.display())]
    DestinationAlreadyExists(PathBuf),
}

impl BackupError {
    pub(crate) fn copy_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BackupError::CopyIo {
            path: path.into(),
            source,
        }
    }

    /// Failures raised before a job was resolved are logged as-is; the rest
    /// are wrapped in the `Backup job '<name>' failed:` form.
    pub fn is_before_job(&self) -> bool {
        matches!(self, BackupError::NoJobName | BackupError::JobNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_texts() {
        assert_eq!(BackupError::NoJobName.to_string(), "No backup job name provided");
        assert_eq!(
            BackupError::JobNotFound("nightly".into()).to_string(),
            "Backup job 'nightly' not found in configuration"
        );
        assert_eq!(BackupError::SourceMissing.to_string(), "Source path does not exist");
        assert_eq!(
            BackupError::DestinationMissing.to_string(),
            "Destination path does not exist"
        );
        assert_eq!(
            BackupError::InvalidSourceType.to_string(),
            "Source path is not a file or directory"
        );
    }

    #[test]
    fn test_copy_io_keeps_os_message() {
        let err = BackupError::copy_io(
            "/backup/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("Permission denied"));
        assert!(msg.contains("/backup/x"));
    }

    #[test]
    fn test_is_before_job() {
        assert!(BackupError::NoJobName.is_before_job());
        assert!(BackupError::JobNotFound("a".into()).is_before_job());
        assert!(!BackupError::SourceMissing.is_before_job());
        assert!(!BackupError::DestinationAlreadyExists("/x".into()).is_before_job());
    }
}

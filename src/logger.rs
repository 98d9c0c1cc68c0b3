//! Append-only log target.
//!
//! Each call opens the log file in append mode, writes one complete line with
//! a single `write_all` and closes the handle again. Lines from concurrent
//! runs therefore never interleave.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::error;

/// Timestamp format of a log line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single `<timestamp> - <message>` line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.message
        )
    }
}

/// Writes status lines to the configured log file.
#[derive(Debug, Clone)]
pub struct Logger {
    path: PathBuf,
}

impl Logger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `message` stamped with the current local time.
    ///
    /// A failed write never reaches the caller; it is reported on the
    /// diagnostic stream instead.
    pub fn log(&self, message: &str) {
        let entry = LogEntry::new(message);
        if let Err(e) = self.append(&entry) {
            error!(
                path = %self.path.display(),
                error = %e,
                "Failed to write log entry: {entry}"
            );
        }
    }

    /// Appends one entry, returning any I/O failure.
    pub fn append(&self, entry: &LogEntry) -> io::Result<()> {
        let line = format!("{entry}\n");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

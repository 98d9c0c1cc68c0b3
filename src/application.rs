//! Configuration for this application.
//!
//! This module defines the configuration object handed to the job runner:
//! the log target, the SMTP relay settings and the table of backup jobs.
//! It is read once from a TOML file at process start and passed by reference
//! from then on.

use crate::error::BackupError;
use crate::job::Job;
use crate::path::expand_path;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Package name.
const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
const CONFIG_NAME: &str = "config.toml";
/// Overrides the configuration file location.
pub const CONFIG_ENV: &str = "BKJOB_CONFIG";
/// Overrides `smtp.password` from the configuration file.
pub const SMTP_PASSWORD_ENV: &str = "BKJOB_SMTP_PASSWORD";
/// Log file used when the configuration does not name one.
const DEFAULT_LOG_FILE: &str = "backup.log";

/// The application configuration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Application {
    /// Append-only log target, one line per run outcome.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Mail relay used for failure alerts.
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Backup jobs by name.
    #[serde(default)]
    pub jobs: JobRegistry,
}

/// SMTP relay and addressing for failure alerts.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
    /// Optional network timeout for the relay session.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

impl Default for Application {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            smtp: SmtpConfig::default(),
            jobs: JobRegistry::default(),
        }
    }
}

impl Application {
    /// Loads the configuration from [`config_file`].
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        let path = config_file();
        if !path.exists() {
            warn!(path = %path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let toml_str = fs::read_to_string(path)
            .with_context(|| format!("Error reading config file '{}'", path.display()))?;
        let app = Self::parse(&toml_str)
            .with_context(|| format!("Error parsing config file '{}'", path.display()))?
            .with_smtp_password(env::var(SMTP_PASSWORD_ENV).ok());
        debug!(path = %path.display(), jobs = app.jobs.len(), "Configuration loaded");
        Ok(app)
    }

    /// Replaces the configured SMTP password when `password` is set.
    pub fn with_smtp_password(mut self, password: Option<String>) -> Self {
        if let Some(password) = password {
            self.smtp.password = password;
        }
        self
    }

    /// Parses a TOML configuration and expands `~` in every configured path.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let mut app: Application = toml::from_str(toml_str)?;
        app.log_file = expand_path(&app.log_file);
        app.jobs.normalize();
        Ok(app)
    }
}

/// Read-only mapping from job name to its source/destination pair.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct JobRegistry {
    jobs: BTreeMap<String, Job>,
}

impl JobRegistry {
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Self {
        let mut registry = Self {
            jobs: jobs.into_iter().map(|job| (job.name.clone(), job)).collect(),
        };
        registry.normalize();
        registry
    }

    /// Looks up a job by name.
    pub fn lookup(&self, name: &str) -> Result<&Job, BackupError> {
        self.jobs
            .get(name)
            .ok_or_else(|| BackupError::JobNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    // Names live in the map keys; copy them into each job and expand paths.
    fn normalize(&mut self) {
        for (name, job) in self.jobs.iter_mut() {
            job.name.clone_from(name);
            job.source = expand_path(&job.source);
            job.destination = expand_path(&job.destination);
        }
    }
}

/// Returns the absolute path to the configuration file.
///
/// `BKJOB_CONFIG` takes precedence over the platform configuration directory.
pub fn config_file() -> PathBuf {
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join(CONFIG_NAME),
    }
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PKG_NAME)
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(PKG_NAME)
}

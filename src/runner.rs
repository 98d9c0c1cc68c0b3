//! One backup invocation, end to end.
//!
//! The runner resolves the job named on the command line, validates its
//! paths, delegates the copy to the executor and reports the outcome: one
//! log line per run, plus a failure alert when the run did not succeed.

use crate::alert::{Alerter, Mailer};
use crate::application::Application;
use crate::error::BackupError;
use crate::executor;
use crate::logger::Logger;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Job name reported when none could be read from the arguments.
pub const UNKNOWN_JOB: &str = "UNKNOWN";

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Failure = 1,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    Success,
    Failure,
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupStatus::Success => f.write_str("SUCCESS"),
            BackupStatus::Failure => f.write_str("FAIL"),
        }
    }
}

/// Outcome of one invocation.
#[derive(Debug, Clone)]
pub struct BackupResult {
    pub status: BackupStatus,
    pub job_name: String,
    /// Log message without the status prefix.
    pub message: String,
    /// Failure detail sent in the alert; empty on success.
    pub detail: String,
    pub timestamp: DateTime<Local>,
}

impl BackupResult {
    fn success(job_name: &str) -> Self {
        Self {
            status: BackupStatus::Success,
            job_name: job_name.to_string(),
            message: format!("Backup job '{job_name}' completed successfully"),
            detail: String::new(),
            timestamp: Local::now(),
        }
    }

    fn failure(job_name: &str, error: &BackupError) -> Self {
        let detail = error.to_string();
        let message = if error.is_before_job() {
            detail.clone()
        } else {
            format!("Backup job '{job_name}' failed: {detail}")
        };
        Self {
            status: BackupStatus::Failure,
            job_name: job_name.to_string(),
            message,
            detail,
            timestamp: Local::now(),
        }
    }

    /// The log line body, `<STATUS> - <message>`.
    pub fn log_message(&self) -> String {
        format!("{} - {}", self.status, self.message)
    }

    pub fn exit_status(&self) -> ExitStatus {
        match self.status {
            BackupStatus::Success => ExitStatus::Success,
            BackupStatus::Failure => ExitStatus::Failure,
        }
    }
}

/// Runs backup jobs from an [`Application`] configuration.
pub struct JobRunner<'a, M: Mailer> {
    app: &'a Application,
    logger: &'a Logger,
    alerter: Alerter<'a, M>,
}

impl<'a, M: Mailer> JobRunner<'a, M> {
    pub fn new(app: &'a Application, logger: &'a Logger, mailer: M) -> Self {
        Self {
            app,
            logger,
            alerter: Alerter::new(&app.smtp, mailer, logger),
        }
    }

    pub fn alerter(&self) -> &Alerter<'a, M> {
        &self.alerter
    }

    /// Runs the job named by `args`, which must hold exactly one element.
    pub fn run(&self, args: &[String]) -> ExitStatus {
        let result = match args {
            [name] => match self.backup(name) {
                Ok(target) => {
                    info!(job = %name, target = %target.display(), "Backup completed");
                    BackupResult::success(name)
                }
                Err(e) => BackupResult::failure(name, &e),
            },
            _ => BackupResult::failure(UNKNOWN_JOB, &BackupError::NoJobName),
        };
        self.report(&result);
        result.exit_status()
    }

    /// Resolves, validates and executes one job.
    pub fn backup(&self, name: &str) -> Result<PathBuf, BackupError> {
        let job = self.app.jobs.lookup(name)?;
        debug!(job = %job.name, source = %job.source.display(), "Job resolved");

        if !job.source.exists() {
            return Err(BackupError::SourceMissing);
        }
        if !job.destination.exists() {
            return Err(BackupError::DestinationMissing);
        }
        executor::execute(&job.source, &job.destination)
    }

    fn report(&self, result: &BackupResult) {
        self.logger.log(&result.log_message());
        if result.status == BackupStatus::Failure {
            self.alerter
                .send_failure_alert(&result.job_name, &result.detail, result.timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertError, AlertMessage};
    use crate::application::JobRegistry;
    use crate::job::Job;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    #[derive(Default)]
    struct Recording(RefCell<Vec<AlertMessage>>);

    impl Mailer for Recording {
        fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
            self.0.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        app: Application,
        logger: Logger,
    }

    impl Fixture {
        fn new(jobs: &[(&str, &str, &str)]) -> Self {
            let dir = tempdir().unwrap();
            let root = dir.path();
            let app = Application {
                log_file: root.join("backup.log"),
                jobs: JobRegistry::new(
                    jobs.iter()
                        .map(|(n, s, d)| Job::new(*n, root.join(s), root.join(d))),
                ),
                ..Application::default()
            };
            let logger = Logger::new(&app.log_file);
            Self { dir, app, logger }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn log_lines(&self) -> Vec<String> {
            fs::read_to_string(self.logger.path())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_successful_file_backup() {
        let fx = Fixture::new(&[("job1", "test", "backup")]);
        fs::write(fx.root().join("test"), "hello").unwrap();
        fs::create_dir(fx.root().join("backup")).unwrap();

        let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
        assert_eq!(runner.run(&args(&["job1"])), ExitStatus::Success);

        let lines = fx.log_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" - SUCCESS - Backup job 'job1' completed successfully"));
        assert!(runner.alerter().mailer().0.borrow().is_empty());

        let entries: Vec<_> = fs::read_dir(fx.root().join("backup"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("test-"));
        assert_eq!(name.len(), "test-YYYYMMDD-HHMMSS".len());
        assert_eq!(fs::read_to_string(&entries[0]).unwrap(), "hello");
    }

    #[test]
    fn test_successful_directory_backup() {
        let fx = Fixture::new(&[("docs", "docs", "backup")]);
        fs::create_dir_all(fx.root().join("docs/sub")).unwrap();
        fs::write(fx.root().join("docs/sub/a.txt"), "a").unwrap();
        fs::create_dir(fx.root().join("backup")).unwrap();

        let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
        let target = runner.backup("docs").unwrap();
        assert_eq!(fs::read_to_string(target.join("sub/a.txt")).unwrap(), "a");
    }

    #[test]
    fn test_wrong_argument_count() {
        for list in [vec![], vec!["job1", "job2"]] {
            let fx = Fixture::new(&[("job1", "test", "backup")]);
            let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
            assert_eq!(runner.run(&args(&list)), ExitStatus::Failure);

            let lines = fx.log_lines();
            assert_eq!(lines.len(), 1);
            assert!(lines[0].ends_with(" - FAIL - No backup job name provided"));

            let sent = runner.alerter().mailer().0.borrow();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].subject, "BACKUP FAILED: UNKNOWN");
            assert!(sent[0].body.contains("Job name: UNKNOWN"));
            assert!(sent[0].body.ends_with("Error: No backup job name provided"));
        }
    }

    #[test]
    fn test_unknown_job() {
        let fx = Fixture::new(&[("job1", "test", "backup")]);
        let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
        assert_eq!(runner.run(&args(&["nightly"])), ExitStatus::Failure);

        let lines = fx.log_lines();
        assert!(lines[0].ends_with(" - FAIL - Backup job 'nightly' not found in configuration"));
        let sent = runner.alerter().mailer().0.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "BACKUP FAILED: nightly");
    }

    #[test]
    fn test_missing_source() {
        let fx = Fixture::new(&[("job3", "null", "backup")]);
        fs::create_dir(fx.root().join("backup")).unwrap();

        let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
        assert_eq!(runner.run(&args(&["job3"])), ExitStatus::Failure);

        let lines = fx.log_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" - FAIL - Backup job 'job3' failed: Source path does not exist"));
        let sent = runner.alerter().mailer().0.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.ends_with("Error: Source path does not exist"));
    }

    #[test]
    fn test_source_checked_before_destination() {
        let fx = Fixture::new(&[("job", "null", "nowhere")]);
        let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
        assert!(matches!(runner.backup("job"), Err(BackupError::SourceMissing)));
    }

    #[test]
    fn test_missing_destination() {
        let fx = Fixture::new(&[("job2", "test", "testdir2")]);
        fs::write(fx.root().join("test"), "hello").unwrap();

        let runner = JobRunner::new(&fx.app, &fx.logger, Recording::default());
        assert_eq!(runner.run(&args(&["job2"])), ExitStatus::Failure);
        assert!(fx.log_lines()[0]
            .ends_with(" - FAIL - Backup job 'job2' failed: Destination path does not exist"));
    }

    #[test]
    fn test_result_messages() {
        let ok = BackupResult::success("job1");
        assert_eq!(ok.log_message(), "SUCCESS - Backup job 'job1' completed successfully");
        assert_eq!(ok.exit_status().code(), 0);

        let fail = BackupResult::failure("job1", &BackupError::InvalidSourceType);
        assert_eq!(
            fail.log_message(),
            "FAIL - Backup job 'job1' failed: Source path is not a file or directory"
        );
        assert_eq!(fail.detail, "Source path is not a file or directory");
        assert_eq!(fail.exit_status().code(), 1);
    }
}

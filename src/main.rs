use bkjob::alert::SmtpMailer;
use bkjob::application::{self, Application};
use bkjob::logger::Logger;
use bkjob::logging;
use bkjob::runner::JobRunner;
use clap::Parser;
use std::process;
use tracing::error;

/// Run a configured backup job and alert by email if it fails.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Name of the backup job to run.
    #[arg(value_name = "JOB", num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Entry point for bkjob.
/// Exits with 0 when the job succeeded and 1 on any failure.
fn main() {
    let cli = Cli::parse();
    logging::init();

    let app = match Application::load() {
        Ok(app) => app,
        Err(e) => {
            error!(
                path = %application::config_file().display(),
                "Failed to load configuration: {e:#}"
            );
            process::exit(1);
        }
    };

    let logger = Logger::new(&app.log_file);
    let runner = JobRunner::new(&app, &logger, SmtpMailer::new(app.smtp.clone()));
    let status = runner.run(&cli.args);
    process::exit(status.code());
}

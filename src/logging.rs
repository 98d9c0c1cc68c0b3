//! Diagnostic output on stderr.
//!
//! The run outcome lives in the log target; this is where the process reports
//! problems it cannot put there (an unwritable log file, a bad configuration).
//! Quiet by default, override with `RUST_LOG`.

use std::io;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber, WARN and above unless `RUST_LOG` says otherwise.
pub fn init() {
    let default_level = Level::WARN;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={}",
            env!("CARGO_CRATE_NAME"),
            default_level.as_str().to_lowercase()
        ))
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init();
}

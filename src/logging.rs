//! Structured logging initialization for the backend.
//!
//! Logs always go to stderr; stdout carries the single JSON result object.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter directive for the given verbosity.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "ddcci=debug,ddcci_plasmoid_backend=debug"
    } else {
        "ddcci=error,ddcci_plasmoid_backend=error"
    }
}

/// Initialize the tracing subscriber based on CLI flags and environment.
///
/// # Arguments
///
/// * `debug` - Raise the default level from `error` to `debug`
/// * `debug_log` - Also append plain log lines to this file
/// * `json` - Emit JSON log lines instead of text
///
/// # Environment Variables
///
/// * `RUST_LOG` - Override the default filter (e.g. "ddcci=trace")
pub fn init_logging(debug: bool, debug_log: Option<&Path>, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let stderr_layer = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(io::stderr().is_terminal())
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr)
            .boxed()
    };

    let (file, file_problem) = match debug_log.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(problem)) => (None, Some(problem)),
        None => (None, None),
    };
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(Mutex::new(file))
            .boxed()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(problem) = file_problem {
        warn!("{problem}, skipping file logging");
    }
}

fn open_log_file(path: &Path) -> Result<File, String> {
    if path.exists() && !path.is_file() {
        return Err(format!("Log path {} is not a regular file", path.display()));
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Cannot open log file {}: {e}", path.display()))
}

//! Logging configuration using tracing

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging system.
///
/// Logs go to stderr, or to `log_file` when given (the GUI has no console on
/// Windows).
pub fn init(verbose: bool, json: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Some(Mutex::new(std::fs::File::create(path)?))
        }
        None => None,
    };

    match (file, json) {
        (Some(file), true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_ansi(false).with_writer(file))
            .init(),
        (Some(file), false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(file))
            .init(),
        (None, true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (None, false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}

//! Tracing subscriber setup.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{io_err, SessionError};
use crate::log_rotation::{rotate_if_needed, MAX_LOG_BYTES, MAX_ROTATED_FILES};

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. With `log_file` set, output
/// is appended there without ANSI colours after rotating the file if needed;
/// otherwise it goes to stderr, where a second install is silently ignored.
pub fn init_tracing(log_file: Option<&Path>) -> Result<(), SessionError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_file) = log_file else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return Ok(());
    };

    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let rotation = rotate_if_needed(log_file, MAX_LOG_BYTES, MAX_ROTATED_FILES);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| io_err(log_file, e))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| SessionError::Logging(err.to_string()))?;

    match rotation {
        Ok(true) => tracing::info!(path = %log_file.display(), "run log rotated"),
        Ok(false) => {}
        Err(err) => tracing::warn!(path = %log_file.display(), error = %err, "run log rotation failed"),
    }
    Ok(())
}

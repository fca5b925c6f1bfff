//! Error types for ramstage-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from copy-in and sync-back.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The rsync binary could not be started at all.
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copy-in exited non-zero. Almost always the RAM disk ran out of space.
    #[error(
        "copying the profile to the RAM disk failed ({status}); \
         the RAM disk is most likely too small for this profile"
    )]
    CopyFailed { status: String, output: String },

    /// Sync-back exited non-zero; the durable profile may be inconsistent.
    #[error("syncing the profile back to {destination} failed ({status})")]
    SyncBackFailed {
        destination: PathBuf,
        status: String,
        output: String,
    },

    /// Nothing to reconcile: the staged directory is gone.
    #[error("staged copy not found at {path}")]
    StageMissing { path: PathBuf },
}

impl SyncError {
    /// Captured tool output, when the error carries any.
    pub fn output(&self) -> Option<&str> {
        match self {
            SyncError::CopyFailed { output, .. } | SyncError::SyncBackFailed { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

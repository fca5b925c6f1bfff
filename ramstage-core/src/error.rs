//! Error types for ramstage-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving a profile, loading settings or
/// building a staging plan.
#[derive(Debug, Error)]
pub enum StageError {
    /// Underlying I/O failure, annotated with the path being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the file path and serde_yaml line context.
    #[error("failed to parse settings at {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (writing a settings template).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `dirs::home_dir()` returned `None`, so `~/.ramstage/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// No eligible default profile, or the resolved directory is missing.
    #[error("profile not found: {detail}")]
    ProfileNotFound { detail: String },

    /// The profile directory name cannot be used as a staging directory name.
    #[error("profile path has no usable directory name: {path}")]
    InvalidProfilePath { path: PathBuf },
}

/// Convenience constructor for [`StageError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StageError {
    StageError::Io {
        path: path.into(),
        source,
    }
}

impl StageError {
    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::ProfileNotFound {
            detail: detail.into(),
        }
    }
}

use std::path::PathBuf;

use thiserror::Error;

use ramstage_core::{OutcomeKind, Phase};

/// Error surface for provisioning, session supervision and run orchestration.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Stage(#[from] ramstage_core::StageError),

    #[error(transparent)]
    Sync(#[from] ramstage_sync::SyncError),

    /// `hdiutil` or `diskutil` failed, or produced nothing usable.
    #[error("could not provision the RAM disk: {detail}")]
    VolumeProvisionFailed { detail: String },

    #[error("could not launch {app}: {detail}")]
    LaunchFailed { app: PathBuf, detail: String },

    #[error("illegal phase transition {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("tracing subscriber: {0}")]
    Logging(String),
}

impl SessionError {
    /// Outcome category for a failure first seen while in `phase`.
    ///
    /// Launch failures are reported as such regardless of phase; everything
    /// else is attributed to the phase that detected it.
    pub fn outcome_kind(&self, phase: Phase) -> OutcomeKind {
        if let SessionError::LaunchFailed { .. } = self {
            return OutcomeKind::LaunchFailed;
        }
        match phase {
            Phase::Idle | Phase::Resolving => OutcomeKind::SourceMissing,
            Phase::Provisioning => OutcomeKind::ProvisioningFailed,
            Phase::CopyingIn => OutcomeKind::CopyFailed,
            Phase::SessionActive | Phase::SyncingBack => OutcomeKind::SyncBackFailed,
            // Errors are never raised from a terminal phase; attribute to
            // the last fallible step.
            Phase::Completed | Phase::Failed => OutcomeKind::SyncBackFailed,
        }
    }

    /// Human-readable detail, with captured tool output appended when present.
    pub fn detail(&self) -> String {
        match self {
            SessionError::Sync(inner) => match inner.output() {
                Some(output) if !output.trim().is_empty() => format!("{self}\n{output}"),
                _ => self.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn provision_failed(detail: impl Into<String>) -> SessionError {
    SessionError::VolumeProvisionFailed {
        detail: detail.into(),
    }
}

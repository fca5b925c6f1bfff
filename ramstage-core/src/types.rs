//! Domain types shared by every ramstage crate.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Label given to the RAM disk when it is formatted (e.g. `RAMDisk`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeName(pub String);

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VolumeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VolumeName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Device node reported by `hdiutil attach` (e.g. `/dev/disk4`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

/// A mounted RAM disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: VolumeName,
    pub mount_point: PathBuf,
    /// `Some` only when this run created the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceId>,
}

impl Volume {
    /// `true` when the volume was created during this run rather than found mounted.
    pub fn provisioned(&self) -> bool {
        self.device.is_some()
    }
}

// ---------------------------------------------------------------------------
// Run phases
// ---------------------------------------------------------------------------

/// Lifecycle of a single run.
///
/// Forward transitions move exactly one step; `Failed` is reachable from any
/// non-terminal phase; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Resolving,
    Provisioning,
    CopyingIn,
    SessionActive,
    SyncingBack,
    Completed,
    Failed,
}

impl Phase {
    /// The phase that normally follows this one, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Resolving),
            Phase::Resolving => Some(Phase::Provisioning),
            Phase::Provisioning => Some(Phase::CopyingIn),
            Phase::CopyingIn => Some(Phase::SessionActive),
            Phase::SessionActive => Some(Phase::SyncingBack),
            Phase::SyncingBack => Some(Phase::Completed),
            Phase::Completed | Phase::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_advance_to(self, to: Phase) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Phase::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Resolving => "resolving profile",
            Phase::Provisioning => "provisioning RAM disk",
            Phase::CopyingIn => "copying profile to RAM disk",
            Phase::SessionActive => "session active",
            Phase::SyncingBack => "syncing profile back",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Terminal outcome
// ---------------------------------------------------------------------------

/// Category of a terminal outcome, as surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    SourceMissing,
    ProvisioningFailed,
    CopyFailed,
    LaunchFailed,
    SyncBackFailed,
    Completed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::SourceMissing => "source-missing",
            OutcomeKind::ProvisioningFailed => "provisioning-failed",
            OutcomeKind::CopyFailed => "copy-failed",
            OutcomeKind::LaunchFailed => "launch-failed",
            OutcomeKind::SyncBackFailed => "sync-back-failed",
            OutcomeKind::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Terminal signal of a run: what happened plus a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub detail: String,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn completed(detail: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Completed, detail)
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Completed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_one_step_at_a_time() {
        assert!(Phase::Idle.can_advance_to(Phase::Resolving));
        assert!(Phase::CopyingIn.can_advance_to(Phase::SessionActive));
        assert!(!Phase::CopyingIn.can_advance_to(Phase::SyncingBack));
        assert!(!Phase::SessionActive.can_advance_to(Phase::CopyingIn));
    }

    #[test]
    fn failed_reachable_from_every_live_phase() {
        let mut phase = Phase::Idle;
        while let Some(next) = phase.next() {
            assert!(phase.can_advance_to(Phase::Failed), "{phase:?}");
            phase = next;
        }
        assert_eq!(phase, Phase::Completed);
    }

    #[test]
    fn terminal_phases_are_final() {
        for phase in [Phase::Completed, Phase::Failed] {
            assert!(phase.is_terminal());
            assert!(!phase.can_advance_to(Phase::Failed));
            assert!(!phase.can_advance_to(Phase::Resolving));
        }
    }

    #[test]
    fn outcome_kind_labels() {
        assert_eq!(OutcomeKind::SyncBackFailed.to_string(), "sync-back-failed");
        let json = serde_json::to_string(&OutcomeKind::SourceMissing).expect("serialize");
        assert_eq!(json, "\"source-missing\"");
    }

    #[test]
    fn volume_provisioned_tracks_device() {
        let mut volume = Volume {
            name: VolumeName::from("RAMDisk"),
            mount_point: PathBuf::from("/Volumes/RAMDisk"),
            device: None,
        };
        assert!(!volume.provisioned());
        volume.device = Some(DeviceId::from("/dev/disk4"));
        assert!(volume.provisioned());
    }
}

//! ramstage core library — domain types, profile discovery, settings, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, [`Phase`], [`Outcome`]
//! - [`plan`] — [`StagingPlan`] and RAM disk capacity maths
//! - [`profiles`] — `profiles.ini` default-profile resolution
//! - [`settings`] — `~/.ramstage/config.yaml`
//! - [`paths`] — on-disk locations
//! - [`error`] — [`StageError`]

pub mod error;
pub mod paths;
pub mod plan;
pub mod profiles;
pub mod settings;
pub mod types;

pub use error::StageError;
pub use plan::StagingPlan;
pub use profiles::ResolvedProfile;
pub use settings::{Settings, ToolPaths};
pub use types::{DeviceId, Outcome, OutcomeKind, Phase, Volume, VolumeName};

//! Staging plan and RAM disk capacity budgeting.
//!
//! Capacity in MB is `max(MIN_CAPACITY_MB, ceil(ceil(bytes / MiB) * 1.2))`,
//! converted to 512-byte blocks at [`BLOCKS_PER_MB`]. All arithmetic is
//! integral so the block count is exact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StageError;
use crate::profiles;
use crate::settings::Settings;
use crate::types::VolumeName;

pub const BYTES_PER_MB: u64 = 1_048_576;
pub const BLOCKS_PER_MB: u64 = 2048;
pub const MIN_CAPACITY_MB: u64 = 512;

/// Headroom over the profile size, as a ratio of tenths (12/10 = 1.2).
const GROWTH_NUMERATOR: u64 = 12;
const GROWTH_DENOMINATOR: u64 = 10;

/// RAM disk size in MB for a profile of `size_bytes`.
pub fn capacity_mb(size_bytes: u64) -> u64 {
    let size_mb = size_bytes.div_ceil(BYTES_PER_MB);
    let grown = (size_mb.saturating_mul(GROWTH_NUMERATOR)).div_ceil(GROWTH_DENOMINATOR);
    grown.max(MIN_CAPACITY_MB)
}

/// 512-byte block count handed to `hdiutil` for a profile of `size_bytes`.
pub fn capacity_blocks(size_bytes: u64) -> u64 {
    capacity_mb(size_bytes).saturating_mul(BLOCKS_PER_MB)
}

/// Everything a run needs to know, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingPlan {
    /// Durable profile directory.
    pub source_path: PathBuf,
    pub source_size_bytes: u64,
    pub volume_name: VolumeName,
    pub mount_point: PathBuf,
    pub capacity_blocks: u64,
}

impl StagingPlan {
    /// Build a plan for `source_path`, mounting the RAM disk under `mount_root`.
    pub fn new(
        source_path: PathBuf,
        source_size_bytes: u64,
        volume_name: VolumeName,
        mount_root: &Path,
    ) -> Result<Self, StageError> {
        if source_path.file_name().is_none() {
            return Err(StageError::InvalidProfilePath { path: source_path });
        }
        let mount_point = mount_root.join(&volume_name.0);
        Ok(Self {
            source_path,
            source_size_bytes,
            volume_name,
            mount_point,
            capacity_blocks: capacity_blocks(source_size_bytes),
        })
    }

    pub fn capacity_mb(&self) -> u64 {
        self.capacity_blocks / BLOCKS_PER_MB
    }

    /// `<mount_point>/<profile dir name>`, where the working copy lives.
    pub fn staged_path(&self) -> PathBuf {
        match self.source_path.file_name() {
            Some(name) => self.mount_point.join(name),
            None => self.mount_point.clone(),
        }
    }
}

/// Locate and size the profile named by `settings`, then build its plan.
///
/// An explicit `profile_path` wins over `profiles.ini` discovery under the
/// configured (or default) profiles root.
pub fn resolve_plan_at(settings: &Settings, home: &Path) -> Result<StagingPlan, StageError> {
    let profile = match &settings.profile_path {
        Some(path) => profiles::resolve_explicit(path.clone())?,
        None => profiles::resolve_at(&settings.profiles_root_at(home))?,
    };
    StagingPlan::new(
        profile.path,
        profile.size_bytes,
        settings.volume_name.clone(),
        &settings.mount_root,
    )
}

//! Filesystem locations used by ramstage.
//!
//! ```text
//! ~/.ramstage/
//!   config.yaml          (optional; defaults apply when absent)
//!   logs/
//!     ramstage.log       (rotated by size before each run)
//! ```

use std::path::{Path, PathBuf};

use crate::error::StageError;

pub const CONFIG_FILE: &str = "config.yaml";
pub const RUN_LOG: &str = "ramstage.log";

pub fn ramstage_root(home: &Path) -> PathBuf {
    home.join(".ramstage")
}

pub fn config_path(home: &Path) -> PathBuf {
    ramstage_root(home).join(CONFIG_FILE)
}

pub fn logs_dir(home: &Path) -> PathBuf {
    ramstage_root(home).join("logs")
}

pub fn run_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(RUN_LOG)
}

/// Where Firefox keeps `profiles.ini` on macOS.
pub fn default_profiles_root(home: &Path) -> PathBuf {
    home.join("Library")
        .join("Application Support")
        .join("Firefox")
}

/// The current user's home directory.
pub fn home() -> Result<PathBuf, StageError> {
    dirs::home_dir().ok_or(StageError::HomeNotFound)
}

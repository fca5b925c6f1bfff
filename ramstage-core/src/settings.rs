//! User settings, read from `~/.ramstage/config.yaml`.
//!
//! Every field has a default, so a missing file (or a file naming only a few
//! keys) is valid.
//!
//! # API pattern
//!
//! As with the other path-dependent helpers:
//! - `load_at(home: &Path)` — explicit home; used in tests with `TempDir`
//! - `load()` — derives home from `dirs::home_dir()`, delegates to `load_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StageError};
use crate::paths;
use crate::types::VolumeName;

/// Paths preserved in the durable profile during sync-back: the per-profile
/// preference override file and the telemetry ping queue.
pub const DEFAULT_EXCLUDES: [&str; 2] = ["user.js", "saved-telemetry-pings"];

pub const DEFAULT_VOLUME_NAME: &str = "FirefoxRAM";
pub const DEFAULT_FILESYSTEM: &str = "HFS+";
pub const DEFAULT_APP_PATH: &str = "/Applications/Firefox.app/Contents/MacOS/firefox";
pub const DEFAULT_PROFILE_FLAG: &str = "-profile";

/// Locations of the external tools ramstage drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub hdiutil: PathBuf,
    pub diskutil: PathBuf,
    pub rsync: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            hdiutil: PathBuf::from("/usr/bin/hdiutil"),
            diskutil: PathBuf::from("/usr/sbin/diskutil"),
            rsync: PathBuf::from("/usr/bin/rsync"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `profiles.ini`. Defaults to Firefox's support directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_root: Option<PathBuf>,
    /// Stage this directory instead of discovering the default profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<PathBuf>,
    pub app_path: PathBuf,
    /// Flag placed before the staged directory on the application command line.
    pub profile_flag: String,
    pub volume_name: VolumeName,
    pub mount_root: PathBuf,
    pub filesystem: String,
    pub excludes: Vec<String>,
    pub tools: ToolPaths,
    pub log_to_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profiles_root: None,
            profile_path: None,
            app_path: PathBuf::from(DEFAULT_APP_PATH),
            profile_flag: DEFAULT_PROFILE_FLAG.to_owned(),
            volume_name: VolumeName::from(DEFAULT_VOLUME_NAME),
            mount_root: PathBuf::from("/Volumes"),
            filesystem: DEFAULT_FILESYSTEM.to_owned(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_owned()).collect(),
            tools: ToolPaths::default(),
            log_to_file: true,
        }
    }
}

impl Settings {
    /// `profiles_root`, falling back to the platform default under `home`.
    pub fn profiles_root_at(&self, home: &Path) -> PathBuf {
        self.profiles_root
            .clone()
            .unwrap_or_else(|| paths::default_profiles_root(home))
    }

    pub fn mount_point(&self) -> PathBuf {
        self.mount_root.join(&self.volume_name.0)
    }

    pub fn to_yaml(&self) -> Result<String, StageError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Load `<home>/.ramstage/config.yaml`, or defaults when it does not exist.
///
/// Returns `StageError::Settings` (with path + line context) on malformed YAML.
pub fn load_at(home: &Path) -> Result<Settings, StageError> {
    let path = paths::config_path(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| StageError::Settings { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, StageError> {
    load_at(&paths::home()?)
}

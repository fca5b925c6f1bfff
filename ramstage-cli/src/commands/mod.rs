//! Subcommand implementations.

pub mod config;
pub mod logs;
pub mod plan;
pub mod profile;
pub mod run;
pub mod status;
pub mod sync_back;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ramstage_core::{settings, Settings, VolumeName};

/// Per-invocation overrides layered over `~/.ramstage/config.yaml`.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Stage this profile directory instead of the profiles.ini default.
    #[arg(long, value_name = "DIR")]
    pub profile: Option<PathBuf>,

    /// Application executable to launch.
    #[arg(long, value_name = "PATH")]
    pub app: Option<PathBuf>,

    /// RAM disk volume label.
    #[arg(long, value_name = "NAME")]
    pub volume_name: Option<String>,
}

impl Overrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(profile) = self.profile {
            settings.profile_path = Some(profile);
        }
        if let Some(app) = self.app {
            settings.app_path = app;
        }
        if let Some(name) = self.volume_name {
            settings.volume_name = VolumeName::from(name);
        }
    }
}

/// Home directory plus settings with `overrides` applied.
pub(crate) fn load_settings(overrides: Overrides) -> Result<(PathBuf, Settings)> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let mut settings = settings::load_at(&home).context("failed to load ramstage settings")?;
    overrides.apply(&mut settings);
    Ok((home, settings))
}

/// `1536000` → `1.5 MB`.
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

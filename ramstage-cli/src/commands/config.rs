//! `ramstage config` — effective settings.

use anyhow::{Context, Result};
use clap::Args;

use ramstage_core::paths::config_path;

use super::{load_settings, Overrides};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings(self.overrides)?;
        let path = config_path(&home);
        let origin = if path.exists() { "" } else { " (not present; defaults)" };
        println!("# {}{origin}", path.display());
        print!("{}", settings.to_yaml().context("failed to render settings")?);
        Ok(())
    }
}

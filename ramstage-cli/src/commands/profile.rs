//! `ramstage profile` — which profile would be staged.

use anyhow::{Context, Result};
use clap::Args;

use ramstage_core::profiles::{self, ResolvedProfile, PROFILES_INI};

use super::{format_bytes, load_settings, Overrides};

/// Arguments for `ramstage profile`.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ProfileArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings(self.overrides)?;

        let (profile, origin): (ResolvedProfile, String) = match &settings.profile_path {
            Some(path) => (
                profiles::resolve_explicit(path.clone()).context("failed to resolve profile")?,
                "explicit path".to_string(),
            ),
            None => {
                let root = settings.profiles_root_at(&home);
                let profile = profiles::resolve_at(&root).context("failed to resolve profile")?;
                (profile, root.join(PROFILES_INI).display().to_string())
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&profile)
                    .context("failed to serialize profile JSON")?
            );
            return Ok(());
        }

        println!("{}", profile.path.display());
        println!("  size    {}", format_bytes(profile.size_bytes));
        println!("  from    {origin}");
        Ok(())
    }
}

//! `ramstage plan` — show what a run would do.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use ramstage_core::plan::resolve_plan_at;

use super::{format_bytes, load_settings, Overrides};

/// Arguments for `ramstage plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanJson {
    source_path: PathBuf,
    source_size_bytes: u64,
    volume_name: String,
    mount_point: PathBuf,
    staged_path: PathBuf,
    capacity_mb: u64,
    capacity_blocks: u64,
    filesystem: String,
    app_path: PathBuf,
    excludes: Vec<String>,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings(self.overrides)?;
        let plan = resolve_plan_at(&settings, &home).context("failed to build staging plan")?;

        let payload = PlanJson {
            staged_path: plan.staged_path(),
            capacity_mb: plan.capacity_mb(),
            source_path: plan.source_path,
            source_size_bytes: plan.source_size_bytes,
            volume_name: plan.volume_name.0,
            mount_point: plan.mount_point,
            capacity_blocks: plan.capacity_blocks,
            filesystem: settings.filesystem,
            app_path: settings.app_path,
            excludes: settings.excludes,
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
            );
            return Ok(());
        }

        println!("{}", "Staging plan".bold());
        println!(
            "  profile     {} ({})",
            payload.source_path.display(),
            format_bytes(payload.source_size_bytes)
        );
        println!(
            "  RAM disk    {} {} MB ({} blocks, {})",
            payload.volume_name, payload.capacity_mb, payload.capacity_blocks, payload.filesystem
        );
        println!("  mount       {}", payload.mount_point.display());
        println!("  staged at   {}", payload.staged_path.display());
        println!("  launch      {}", payload.app_path.display());
        if payload.excludes.is_empty() {
            println!("  preserved   {}", "(none)".dimmed());
        } else {
            println!("  preserved   {}", payload.excludes.join(", "));
        }
        Ok(())
    }
}

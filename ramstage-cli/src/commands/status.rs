//! `ramstage status` — RAM disk and staged copy visibility.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use ramstage_core::plan::resolve_plan_at;
use ramstage_session::volume::{probe, VolumeStatus};

use super::{load_settings, Overrides};

/// Arguments for `ramstage status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "item")]
    item: &'static str,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "path")]
    path: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings(self.overrides)?;

        // Status stays useful when the profile cannot be resolved.
        let staged = resolve_plan_at(&settings, &home)
            .map(|plan| plan.staged_path())
            .ok();
        let status = probe(&settings.volume_name, &settings.mount_point(), staged.as_deref());

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&status);
        Ok(())
    }
}

fn print_table(status: &VolumeStatus) {
    println!(
        "ramstage v{} | volume {}",
        env!("CARGO_PKG_VERSION"),
        status.volume_name
    );

    let rows = vec![
        StatusTableRow {
            item: "RAM disk",
            state: indicator(status.mounted, "MOUNTED", "NOT MOUNTED"),
            path: status.mount_point.display().to_string(),
        },
        StatusTableRow {
            item: "staged profile",
            state: indicator(status.staged_present, "PRESENT", "ABSENT"),
            path: status
                .staged_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "profile not resolved".to_string()),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if status.staged_present {
        println!("A staged copy exists. If no session is running, 'ramstage sync-back' reconciles it.");
    }
}

fn indicator(on: bool, yes: &str, no: &str) -> String {
    if on {
        format!("{} {yes}", "■".green().bold())
    } else {
        format!("{} {no}", "■".bright_black().bold())
    }
}

//! `ramstage sync-back` — manual reconciliation after an interrupted run.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ramstage_core::plan::resolve_plan_at;
use ramstage_core::paths::run_log_path;
use ramstage_session::{init_tracing, recover_blocking};

use super::{load_settings, Overrides};

/// Arguments for `ramstage sync-back`.
#[derive(Args, Debug)]
pub struct SyncBackArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    pub yes: bool,
}

impl SyncBackArgs {
    pub fn run(self) -> Result<ExitCode> {
        let (home, settings) = load_settings(self.overrides)?;
        if settings.log_to_file {
            init_tracing(Some(&run_log_path(&home))).context("failed to initialise logging")?;
        }

        let plan = resolve_plan_at(&settings, &home).context("failed to build staging plan")?;
        let staged = plan.staged_path();
        if !self.yes
            && !confirm(&format!(
                "Mirror {} onto {}? Files missing from the staged copy will be deleted.",
                staged.display(),
                plan.source_path.display()
            ))?
        {
            println!("aborted");
            return Ok(ExitCode::SUCCESS);
        }

        match recover_blocking(&settings, &plan) {
            Ok(result) => {
                println!(
                    "{} profile synced back to {}",
                    "✓".green().bold(),
                    result.destination.display()
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{} {}", "sync-back-failed".red().bold(), err.detail());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush().context("flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

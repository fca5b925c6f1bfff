//! `ramstage run` — one full staged session.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use ramstage_core::paths::run_log_path;
use ramstage_session::{init_tracing, start_blocking};

use super::{load_settings, Overrides};
use crate::presenter::TerminalPresenter;

/// Arguments for `ramstage run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Log to stderr instead of the run log file.
    #[arg(long, short)]
    pub verbose: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<ExitCode> {
        let (home, settings) = load_settings(self.overrides)?;

        if self.verbose {
            init_tracing(None).context("failed to initialise logging")?;
        } else if settings.log_to_file {
            init_tracing(Some(&run_log_path(&home))).context("failed to initialise logging")?;
        }

        let outcome = start_blocking(settings, &home, Arc::new(TerminalPresenter::new()))
            .context("failed to start the async runtime")?;

        if outcome.is_success() {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::FAILURE)
        }
    }
}

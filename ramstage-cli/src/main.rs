//! ramstage — run Firefox from a RAM disk and sync the profile back on exit.
//!
//! # Usage
//!
//! ```text
//! ramstage run [--profile <dir>] [--app <path>] [--volume-name <name>] [--verbose]
//! ramstage plan [--json]
//! ramstage profile [--json]
//! ramstage status [--json]
//! ramstage sync-back [--yes]
//! ramstage logs [--lines <n>]
//! ramstage config
//! ```

mod commands;
mod presenter;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, logs::LogsArgs, plan::PlanArgs, profile::ProfileArgs, run::RunArgs,
    status::StatusArgs, sync_back::SyncBackArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ramstage",
    version,
    about = "Stage a Firefox profile on a RAM disk for the length of a session",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision the RAM disk, copy the profile in, launch, and sync back on exit.
    Run(RunArgs),

    /// Show the staging plan without touching anything.
    Plan(PlanArgs),

    /// Show which profile directory would be staged.
    Profile(ProfileArgs),

    /// Show whether the RAM disk and a staged copy are present.
    Status(StatusArgs),

    /// Reconcile a staged copy left behind by an interrupted run.
    SyncBack(SyncBackArgs),

    /// Print recent lines of the run log.
    Logs(LogsArgs),

    /// Print the effective settings.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Plan(args) => args.run().map(|()| ExitCode::SUCCESS),
        Commands::Profile(args) => args.run().map(|()| ExitCode::SUCCESS),
        Commands::Status(args) => args.run().map(|()| ExitCode::SUCCESS),
        Commands::SyncBack(args) => args.run(),
        Commands::Logs(args) => args.run().map(|()| ExitCode::SUCCESS),
        Commands::Config(args) => args.run().map(|()| ExitCode::SUCCESS),
    }
}

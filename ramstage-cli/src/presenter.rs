//! Terminal rendering of a run: one line per phase, a bar while copying.

use std::sync::Mutex;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use ramstage_core::{Outcome, Phase};
use ramstage_session::Presenter;
use ramstage_sync::ProgressSink;

const BAR_TEMPLATE: &str = "  {bar:40.cyan/blue} {pos:>3}%";

#[derive(Default)]
pub struct TerminalPresenter {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        let mut bar = self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut bar);
    }

    fn finish_bar(&self) {
        self.with_bar(|bar| {
            if let Some(bar) = bar.take() {
                bar.finish();
            }
        });
    }
}

impl ProgressSink for TerminalPresenter {
    fn on_progress(&self, percent: u8) {
        self.with_bar(|bar| {
            let bar = bar.get_or_insert_with(new_bar);
            bar.set_position(u64::from(percent));
        });
    }
}

impl Presenter for TerminalPresenter {
    fn on_phase(&self, phase: Phase) {
        self.finish_bar();
        match phase {
            Phase::Idle => {}
            Phase::Completed => println!("{} {phase}", "✓".green().bold()),
            Phase::Failed => println!("{} {phase}", "✗".red().bold()),
            Phase::SessionActive => {
                println!("{} {phase}", "▸".cyan().bold());
                println!("  {}", "quit the application to sync the profile back".dimmed());
            }
            Phase::CopyingIn => {
                println!("{} {phase}", "▸".cyan().bold());
                self.with_bar(|bar| *bar = Some(new_bar()));
            }
            _ => println!("{} {phase}", "▸".cyan().bold()),
        }
    }

    fn on_outcome(&self, outcome: &Outcome) {
        self.finish_bar();
        if outcome.is_success() {
            println!("{} {}", outcome.kind.to_string().green().bold(), outcome.detail);
        } else {
            eprintln!("{} {}", outcome.kind.to_string().red().bold(), outcome.detail);
        }
    }
}

fn new_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

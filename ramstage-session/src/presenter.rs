//! Run events and the single presentation task that consumes them.
//!
//! Orchestration never touches the terminal directly. Phase changes,
//! progress percentages and the final outcome are sent over an unbounded
//! channel to one task that owns the [`Presenter`], so output is never
//! interleaved no matter which task produced the event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ramstage_core::{Outcome, Phase};
use ramstage_sync::ProgressSink;

/// Something that shows a run to a user.
pub trait Presenter: ProgressSink {
    fn on_phase(&self, phase: Phase);
    fn on_outcome(&self, outcome: &Outcome);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Phase(Phase),
    Progress(u8),
    Outcome(Outcome),
}

/// Producer side of the presentation channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl EventSender {
    pub fn phase(&self, phase: Phase) {
        self.send(RunEvent::Phase(phase));
    }

    pub fn outcome(&self, outcome: Outcome) {
        self.send(RunEvent::Outcome(outcome));
    }

    fn send(&self, event: RunEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("presentation task gone; event dropped");
        }
    }
}

impl ProgressSink for EventSender {
    fn on_progress(&self, percent: u8) {
        self.send(RunEvent::Progress(percent));
    }
}

/// Spawn the presentation task. It ends once every [`EventSender`] is dropped.
pub fn spawn_presentation(presenter: Arc<dyn Presenter>) -> (EventSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<RunEvent>();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Phase(phase) => presenter.on_phase(phase),
                RunEvent::Progress(percent) => presenter.on_progress(percent),
                RunEvent::Outcome(outcome) => presenter.on_outcome(&outcome),
            }
        }
    });
    (EventSender { tx }, handle)
}

/// Presenter that only logs. Used when nothing is attached to a terminal.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl ProgressSink for LogPresenter {
    fn on_progress(&self, percent: u8) {
        tracing::debug!(percent, "copy progress");
    }
}

impl Presenter for LogPresenter {
    fn on_phase(&self, phase: Phase) {
        tracing::info!(%phase, "phase");
    }

    fn on_outcome(&self, outcome: &Outcome) {
        if outcome.is_success() {
            tracing::info!(kind = %outcome.kind, detail = %outcome.detail, "run finished");
        } else {
            tracing::error!(kind = %outcome.kind, detail = %outcome.detail, "run failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<RunEvent>>);

    impl ProgressSink for Recording {
        fn on_progress(&self, percent: u8) {
            self.0.lock().expect("lock").push(RunEvent::Progress(percent));
        }
    }

    impl Presenter for Recording {
        fn on_phase(&self, phase: Phase) {
            self.0.lock().expect("lock").push(RunEvent::Phase(phase));
        }
        fn on_outcome(&self, outcome: &Outcome) {
            self.0.lock().expect("lock").push(RunEvent::Outcome(outcome.clone()));
        }
    }

    #[tokio::test]
    async fn events_arrive_in_send_order() {
        let recording = Arc::new(Recording::default());
        let (events, handle) = spawn_presentation(recording.clone());

        events.phase(Phase::CopyingIn);
        events.on_progress(40);
        events.on_progress(100);
        events.outcome(Outcome::completed("done"));
        drop(events);
        handle.await.expect("presentation task");

        assert_eq!(
            *recording.0.lock().expect("lock"),
            vec![
                RunEvent::Phase(Phase::CopyingIn),
                RunEvent::Progress(40),
                RunEvent::Progress(100),
                RunEvent::Outcome(Outcome::completed("done")),
            ]
        );
    }
}

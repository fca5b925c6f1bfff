//! Application launch and termination watching.
//!
//! Each launched process gets exactly one termination watch in a
//! [`WatchRegistry`]. The watch is a oneshot channel keyed by pid; firing it
//! removes the entry, so a second notification for the same pid is dropped
//! and sync-back can only ever be triggered once per session.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::error::SessionError;

/// How the application ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionExit {
    Code(i32),
    Signal(i32),
    /// Waiting on the process failed; it is treated as terminated.
    Unknown(String),
}

impl SessionExit {
    pub fn from_status(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => SessionExit::Code(code),
            (None, Some(signal)) => SessionExit::Signal(signal),
            (None, None) => SessionExit::Unknown(status.to_string()),
        }
    }

    /// Clean exit. Anything else still leads to sync-back.
    pub fn is_clean(&self) -> bool {
        matches!(self, SessionExit::Code(0))
    }
}

impl fmt::Display for SessionExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionExit::Code(code) => write!(f, "exit code {code}"),
            SessionExit::Signal(signal) => write!(f, "signal {signal}"),
            SessionExit::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// Pending termination watches, keyed by pid.
#[derive(Debug, Clone, Default)]
pub struct WatchRegistry {
    inner: Arc<Mutex<HashMap<u32, oneshot::Sender<SessionExit>>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single watch for `pid`. `None` if one is already pending.
    pub fn register(&self, pid: u32) -> Option<oneshot::Receiver<SessionExit>> {
        let mut watches = self.lock();
        if watches.contains_key(&pid) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        watches.insert(pid, tx);
        Some(rx)
    }

    /// Deliver the termination of `pid`. Returns `false` when no watch was
    /// pending (already fired, or never registered).
    pub fn fire(&self, pid: u32, exit: SessionExit) -> bool {
        let Some(tx) = self.lock().remove(&pid) else {
            return false;
        };
        // The receiver may be gone if the run was abandoned; the watch is
        // consumed either way.
        let _ = tx.send(exit);
        true
    }

    pub fn is_watching(&self, pid: u32) -> bool {
        self.lock().contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, oneshot::Sender<SessionExit>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A running application instance.
#[derive(Debug)]
pub struct Session {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    exit: oneshot::Receiver<SessionExit>,
}

impl Session {
    /// Wait for the watch to fire.
    pub async fn wait(self) -> SessionExit {
        match self.exit.await {
            Ok(exit) => exit,
            Err(_) => SessionExit::Unknown("termination watch dropped".to_string()),
        }
    }
}

/// Start `app <profile_flag> <staged>` and watch it in the background.
///
/// Must be called from within a tokio runtime. An empty `profile_flag` passes
/// the staged path as the only argument.
pub fn launch(
    app: &Path,
    profile_flag: &str,
    staged: &Path,
    watches: &WatchRegistry,
) -> Result<Session, SessionError> {
    let launch_failed = |detail: String| SessionError::LaunchFailed {
        app: app.to_path_buf(),
        detail,
    };

    let mut command = Command::new(app);
    if !profile_flag.is_empty() {
        command.arg(profile_flag);
    }
    command
        .arg(staged)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = command.spawn().map_err(|err| launch_failed(err.to_string()))?;
    let pid = child
        .id()
        .ok_or_else(|| launch_failed("process exited before its pid was read".to_string()))?;
    let exit = watches
        .register(pid)
        .ok_or_else(|| launch_failed(format!("pid {pid} is already being watched")))?;

    let started_at = Utc::now();
    tracing::info!(
        pid,
        app = %app.display(),
        staged = %staged.display(),
        "application launched",
    );

    let registry = watches.clone();
    tokio::spawn(async move {
        let exit = match child.wait().await {
            Ok(status) => SessionExit::from_status(status),
            Err(err) => SessionExit::Unknown(err.to_string()),
        };
        tracing::info!(pid, %exit, "application terminated");
        if !registry.fire(pid, exit) {
            tracing::debug!(pid, "termination already delivered");
        }
    });

    Ok(Session {
        pid,
        started_at,
        exit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_fires_at_most_once() {
        let registry = WatchRegistry::new();
        let mut rx = registry.register(42).expect("first registration");
        assert!(registry.register(42).is_none(), "duplicate watch");

        assert!(registry.fire(42, SessionExit::Code(0)));
        assert!(!registry.fire(42, SessionExit::Code(1)));
        assert!(registry.is_empty());
        assert_eq!(rx.try_recv().expect("delivered"), SessionExit::Code(0));
    }

    #[test]
    fn firing_an_unknown_pid_is_a_noop() {
        let registry = WatchRegistry::new();
        assert!(!registry.fire(7, SessionExit::Signal(9)));
    }

    #[test]
    fn only_a_zero_exit_is_clean() {
        assert!(SessionExit::Code(0).is_clean());
        assert!(!SessionExit::Code(1).is_clean());
        assert!(!SessionExit::Signal(9).is_clean());
        assert_eq!(SessionExit::Signal(9).to_string(), "signal 9");
    }

    #[tokio::test]
    async fn launched_process_is_watched_until_exit() {
        let registry = WatchRegistry::new();
        let session = launch(
            Path::new("/bin/sh"),
            "-c",
            Path::new("exit 3"),
            &registry,
        )
        .expect("launch");
        let pid = session.pid;
        assert_eq!(session.wait().await, SessionExit::Code(3));
        assert!(!registry.is_watching(pid));
    }

    #[tokio::test]
    async fn missing_app_is_a_launch_failure() {
        let registry = WatchRegistry::new();
        let err = launch(
            Path::new("/nonexistent/firefox"),
            "-profile",
            Path::new("/tmp"),
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::LaunchFailed { .. }));
        assert!(registry.is_empty());
    }
}

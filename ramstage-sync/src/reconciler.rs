//! Sync-back: reconcile the staged copy into the durable profile.
//!
//! One-shot `rsync -a --delete` from the staged copy to the original. Paths
//! matching an exclude pattern are neither copied nor deleted, so they survive
//! in the destination even when the staged side lacks them. Never retried.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SyncError;
use crate::rsync::{self, describe_status};

/// Terminal result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub success: bool,
    /// `None` when rsync was killed by a signal.
    pub exit_code: Option<i32>,
    pub destination: PathBuf,
    /// Trailing rsync output, kept for diagnosis.
    pub output: String,
}

/// Reconcile `staged` into `original`, preserving `excludes`.
///
/// A non-zero rsync exit is returned as [`SyncError::SyncBackFailed`] with the
/// captured output; the caller must surface it rather than retry.
pub async fn sync_back(
    rsync_bin: &Path,
    staged: &Path,
    original: &Path,
    excludes: &[String],
) -> Result<ReconciliationResult, SyncError> {
    if !tokio::fs::try_exists(staged).await.unwrap_or(false) {
        return Err(SyncError::StageMissing {
            path: staged.to_path_buf(),
        });
    }

    tracing::info!(
        staged = %staged.display(),
        original = %original.display(),
        ?excludes,
        "syncing staged profile back",
    );

    let args = rsync::sync_back_args(staged, original, excludes);
    let output = rsync::run_streaming(rsync_bin, &args, |line| {
        tracing::trace!(line, "rsync");
    })
    .await?;

    let result = ReconciliationResult {
        success: output.status.success(),
        exit_code: output.status.code(),
        destination: original.to_path_buf(),
        output: output.tail_text(),
    };

    if !result.success {
        let status = describe_status(&output.status);
        tracing::error!(
            destination = %original.display(),
            %status,
            output = %result.output,
            "sync-back failed; durable profile may be inconsistent",
        );
        return Err(SyncError::SyncBackFailed {
            destination: result.destination,
            status,
            output: result.output,
        });
    }

    tracing::info!(destination = %original.display(), "sync-back completed");
    Ok(result)
}

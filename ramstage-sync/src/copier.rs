//! Copy-in: stage a profile onto the RAM disk.
//!
//! 1. Remove the destination if it exists (full replacement, never a merge).
//! 2. `rsync -a --progress <source>/ <destination>`.
//! 3. Feed every progress line into [`TransferState`] and the sink.
//! 4. Non-zero exit → [`SyncError::CopyFailed`]; success → one final 100%.

use std::path::Path;

use crate::error::{io_err, SyncError};
use crate::progress::{parse_progress_line, ProgressSink, TransferState};
use crate::rsync::{self, describe_status};

/// Result of a successful copy-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub total_bytes: u64,
    /// Accumulated reported bytes; may exceed `total_bytes`.
    pub reported_bytes: u64,
}

/// Copy `source` into `destination` with byte-progress reporting.
pub async fn copy_in(
    rsync_bin: &Path,
    source: &Path,
    destination: &Path,
    total_bytes: u64,
    sink: &dyn ProgressSink,
) -> Result<CopySummary, SyncError> {
    clear_destination(destination).await?;

    let mut state = TransferState::new(total_bytes);
    let args = rsync::copy_in_args(source, destination);
    let output = rsync::run_streaming(rsync_bin, &args, |line| {
        if let Some(bytes) = parse_progress_line(line) {
            sink.on_progress(state.record(bytes));
        }
    })
    .await?;

    if !output.status.success() {
        let status = describe_status(&output.status);
        tracing::error!(
            source = %source.display(),
            destination = %destination.display(),
            %status,
            "copy-in failed",
        );
        tracing::debug!(output = %output.tail_text(), "copy-in output");
        return Err(SyncError::CopyFailed {
            status,
            output: output.tail_text(),
        });
    }

    sink.on_progress(100);
    tracing::info!(
        destination = %destination.display(),
        total_bytes,
        reported_bytes = state.transferred_bytes(),
        "copy-in completed",
    );
    Ok(CopySummary {
        total_bytes,
        reported_bytes: state.transferred_bytes(),
    })
}

async fn clear_destination(destination: &Path) -> Result<(), SyncError> {
    let meta = match tokio::fs::symlink_metadata(destination).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_err(destination, err)),
    };

    tracing::info!(path = %destination.display(), "removing previous staged copy");
    let removed = if meta.is_dir() {
        tokio::fs::remove_dir_all(destination).await
    } else {
        tokio::fs::remove_file(destination).await
    };
    removed.map_err(|e| io_err(destination, e))
}

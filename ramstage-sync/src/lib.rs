//! # ramstage-sync
//!
//! rsync-backed tree transfer between the durable profile and the RAM disk.
//!
//! Call [`copy_in`] to stage a profile with progress reporting, and
//! [`sync_back`] to reconcile the staged copy into the original.

pub mod copier;
pub mod error;
pub mod progress;
pub mod reconciler;
pub mod rsync;

pub use copier::{copy_in, CopySummary};
pub use error::SyncError;
pub use progress::{ProgressSink, TransferState};
pub use reconciler::{sync_back, ReconciliationResult};

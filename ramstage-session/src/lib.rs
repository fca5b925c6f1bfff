//! # ramstage-session
//!
//! Everything that happens after a profile has been resolved: RAM disk
//! provisioning, copy-in, launching and watching the application, and the
//! final sync-back, driven as one phase machine by [`run`].

mod error;
pub mod log_rotation;
pub mod logging;
pub mod presenter;
mod runtime;
pub mod session;
pub mod volume;

pub use error::SessionError;
pub use logging::init_tracing;
pub use presenter::{LogPresenter, Presenter, RunEvent};
pub use runtime::{
    recover, recover_blocking, resolve_plan, run, start_blocking, RunContext,
};
pub use session::{Session, SessionExit, WatchRegistry};
pub use volume::VolumeStatus;

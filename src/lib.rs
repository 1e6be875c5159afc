//! Orchestration core for a git submodule manager.
//!
//! User-confirmed mutations of a working tree and its submodules run on a worker
//! pool under a waiting status, surface their errors and then refresh the cached
//! views. Self-update checks and installs go through the same machinery with a
//! single-flight guard. The frontend supplies the collaborators in [`traits`] and
//! drives an [`orchestrator::Session`] from its event loop.

pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod status;
pub mod traits;

pub use error::{ActionError, CommandError, RefreshError};
pub use model::{
    ActionOutcome, AppEvent, RefreshMode, RefreshRequest, RefreshScope, Submodule, ViewKind,
    WorkingFile,
};
pub use orchestrator::{Session, Signal};
pub use status::StatusManager;

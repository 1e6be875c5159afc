//! Action, status and refresh orchestration.
//!
//! The worker loop runs mutations, version checks and updates off the UI thread.
//! Everything else here lives on the UI loop: prompt chains, the action pipeline,
//! the submodule and self-update controllers, and the [`Session`] that owns them.

mod controller;
mod coordinator;
mod prompt;
mod refresh;
mod session;
mod submodules;
mod updates;

pub use controller::{run_controller, Job, WorkerCommand, WorkerHandle};
pub use coordinator::{Action, ActionCoordinator, ActionStep, FailurePolicy, Menu, MenuItem};
pub use prompt::{ChainDriver, ChainProgress, PromptChain, PromptStep};
pub use refresh::{RefreshScheduler, Refresher, ViewLoader};
pub use session::{Collaborators, Session, Signal};
pub use submodules::{file_for_submodule, suggest_name, SubmoduleLifecycleController};
pub use updates::{CheckMode, UpdateOrchestrator, UpdatePhase, UpdateState, UpdateStep};

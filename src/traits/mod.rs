//! Collaborator seams.
//!
//! Everything the orchestration core consumes but does not implement: command
//! execution, prompt rendering, the file index, error/log sinks and the release
//! channel. Implementations live with the frontend; tests substitute fakes.

mod executor;
mod presenter;
mod release;
mod sink;

pub use executor::{CommandExecutor, FileIndex, GitIntent, SubmoduleNavigator};
pub use presenter::{MenuItemView, MenuView, PromptKind, PromptView, Presenter};
pub use release::{Updater, VersionSource};
pub use sink::{ActionLog, ErrorSink};

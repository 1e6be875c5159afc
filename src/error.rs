use crate::model::ViewKind;
use thiserror::Error;

/// The command executor reported a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    /// Human-readable form of the command that failed.
    pub command: String,
    pub message: String,
}

impl CommandError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFailure {
    pub view: ViewKind,
    pub message: String,
}

/// Aggregate of every view that failed to recompute in one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("refresh failed: {}", describe_failures(.failures))]
pub struct RefreshError {
    pub failures: Vec<ViewFailure>,
}

fn describe_failures(failures: &[ViewFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{:?}: {}", f.view, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Mutation(#[from] CommandError),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error("action aborted: {0}")]
    Aborted(String),
}

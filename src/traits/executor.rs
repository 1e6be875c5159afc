use crate::error::CommandError;
use crate::model::{Submodule, WorkingFile};

/// Domain intents the executor turns into concrete git invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitIntent {
    AddSubmodule {
        name: String,
        path: String,
        url: String,
    },
    UpdateSubmoduleUrl {
        name: String,
        path: String,
        url: String,
    },
    InitSubmodule {
        path: String,
    },
    UpdateSubmodule {
        path: String,
    },
    StashSubmodule {
        path: String,
    },
    ResetSubmodule {
        path: String,
    },
    DeleteSubmodule {
        name: String,
        path: String,
    },
    UnstageFile {
        names: Vec<String>,
        tracked: bool,
    },
    BulkInit,
    BulkUpdate,
    ForceBulkUpdate,
    BulkDeinit,
}

/// Builds and runs the command behind a [`GitIntent`].
///
/// `run` is blocking; callers dispatch it to a worker themselves.
pub trait CommandExecutor: Send + Sync {
    /// Literal command line shown to the user for `intent`.
    fn command_string(&self, intent: &GitIntent) -> String;

    fn run(&self, intent: &GitIntent) -> Result<(), CommandError>;
}

/// Read access to the working-tree file list.
pub trait FileIndex {
    fn all_files(&self) -> &[WorkingFile];
}

impl FileIndex for [WorkingFile] {
    fn all_files(&self) -> &[WorkingFile] {
        self
    }
}

impl FileIndex for Vec<WorkingFile> {
    fn all_files(&self) -> &[WorkingFile] {
        self
    }
}

/// Switches the frontend into a submodule's repository context.
pub trait SubmoduleNavigator {
    fn enter_submodule(&mut self, submodule: &Submodule) -> anyhow::Result<()>;
}

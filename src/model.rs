use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A submodule as recorded in `.gitmodules`. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submodule {
    pub name: String,
    pub path: String,
    pub url: String,
}

impl Submodule {
    pub fn new(name: impl Into<String>, path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            url: url.into(),
        }
    }
}

/// One entry of the working-tree file index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingFile {
    pub name: String,
    #[serde(default)]
    pub previous_name: Option<String>,
    pub tracked: bool,
}

impl WorkingFile {
    pub fn new(name: impl Into<String>, tracked: bool) -> Self {
        Self {
            name: name.into(),
            previous_name: None,
            tracked,
        }
    }

    /// Current name followed by the rename source, if any.
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        if let Some(prev) = &self.previous_name {
            names.push(prev.clone());
        }
        names
    }

    /// True when this file is the gitlink of one of `candidates`.
    pub fn is_submodule(&self, candidates: &[Submodule]) -> bool {
        candidates.iter().any(|s| s.path == self.name)
    }
}

/// View categories whose cached state a refresh can invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    Submodules,
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Recompute before returning to the caller.
    #[default]
    Sync,
    /// Return immediately and recompute on the blocking pool.
    Async,
}

/// Non-empty set of views to recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshScope(BTreeSet<ViewKind>);

impl RefreshScope {
    pub fn of(view: ViewKind) -> Self {
        Self(BTreeSet::from([view]))
    }

    /// Returns `None` for an empty iterator.
    pub fn from_views(views: impl IntoIterator<Item = ViewKind>) -> Option<Self> {
        let set: BTreeSet<ViewKind> = views.into_iter().collect();
        if set.is_empty() {
            None
        } else {
            Some(Self(set))
        }
    }

    #[must_use]
    pub fn with(mut self, view: ViewKind) -> Self {
        self.0.insert(view);
        self
    }

    pub fn contains(&self, view: ViewKind) -> bool {
        self.0.contains(&view)
    }

    pub fn iter(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub mode: RefreshMode,
    pub scope: RefreshScope,
}

impl RefreshRequest {
    pub fn sync(scope: RefreshScope) -> Self {
        Self {
            mode: RefreshMode::Sync,
            scope,
        }
    }

    pub fn background(scope: RefreshScope) -> Self {
        Self {
            mode: RefreshMode::Async,
            scope,
        }
    }
}

/// Freshly computed state for one view, published back onto the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewData {
    Submodules(Vec<Submodule>),
    Files(Vec<WorkingFile>),
}

impl ViewData {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewData::Submodules(_) => ViewKind::Submodules,
            ViewData::Files(_) => ViewKind::Files,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Cancelled,
    Succeeded,
    Failed(ActionError),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded)
    }
}

/// Identifies one background job between submission and completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobTicket(pub(crate) u64);

/// Result payload a worker hands back for a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutput {
    Action(ActionOutcome),
    VersionCheck(Result<Option<String>, String>),
    Update(Result<(), String>),
}

/// The job did not run to completion (it panicked or was aborted on shutdown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAborted {
    pub message: String,
}

/// Messages delivered to the UI loop. Workers never touch UI-owned state directly;
/// they send one of these instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    JobFinished {
        ticket: JobTicket,
        result: Result<JobOutput, JobAborted>,
    },
    ViewRefreshed(ViewData),
    Error(String),
}

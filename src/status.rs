//! Registry of in-flight long-running operations.
//!
//! Owned by the UI loop. Entries are prepended so the head is always the most
//! recently added status, which is the one shown to the user.

/// Token returned by [`StatusManager::add_waiting_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingStatus {
    pub id: StatusId,
    pub label: String,
}

const LOADER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Default)]
pub struct StatusManager {
    statuses: Vec<WaitingStatus>,
    next_id: u64,
}

impl StatusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_waiting_status(&mut self, label: impl Into<String>) -> StatusId {
        self.next_id += 1;
        let id = StatusId(self.next_id);
        self.statuses.insert(
            0,
            WaitingStatus {
                id,
                label: label.into(),
            },
        );
        id
    }

    /// Removing an unknown or already-removed id is a no-op.
    pub fn remove_status(&mut self, id: StatusId) {
        self.statuses.retain(|s| s.id != id);
    }

    pub fn current_status_text(&self) -> &str {
        self.statuses.first().map_or("", |s| s.label.as_str())
    }

    /// Current label with a spinner frame for the given render tick, or "" when idle.
    pub fn status_line(&self, tick: usize) -> String {
        match self.statuses.first() {
            Some(s) => format!("{} {}", s.label, LOADER_FRAMES[tick % LOADER_FRAMES.len()]),
            None => String::new(),
        }
    }

    pub fn is_active(&self, id: StatusId) -> bool {
        self.statuses.iter().any(|s| s.id == id)
    }

    pub fn active(&self) -> &[WaitingStatus] {
        &self.statuses
    }
}

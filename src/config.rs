//! User configuration and persisted application state.
//!
//! Both are JSON files under the platform config/state directories. A missing file
//! yields defaults; a malformed one is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;

const APP_DIR: &str = "subdeck";

/// How a newer release found by a background check is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMethod {
    /// Ask before downloading.
    #[default]
    Prompt,
    /// Download without asking.
    Background,
    /// Never check in the background.
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateConfig {
    pub method: UpdateMethod,
    /// Minimum spacing between background checks.
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            method: UpdateMethod::Prompt,
            check_interval: Duration::from_secs(14 * 24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub update: UpdateConfig,
}

impl UserConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        match read_optional(path)? {
            Some(data) => serde_json::from_str(&data)
                .with_context(|| format!("parse config {}", path.display())),
            None => Ok(Self::default()),
        }
    }

    /// Loads from [`UserConfig::default_path`], or defaults when no config dir exists.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// State the application writes for itself between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppState {
    /// Unix timestamp (seconds) of the last background update check.
    pub last_update_check: Option<i64>,
}

impl AppState {
    pub fn default_path() -> Option<PathBuf> {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|d| d.join(APP_DIR).join("state.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        match read_optional(path)? {
            Some(data) => serde_json::from_str(&data)
                .with_context(|| format!("parse state {}", path.display())),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data).with_context(|| format!("write {}", path.display()))
    }

    pub fn update_check_due(&self, interval: Duration, now: OffsetDateTime) -> bool {
        let Some(last) = self.last_update_check else {
            return true;
        };
        let elapsed = now.unix_timestamp().saturating_sub(last);
        // A clock that went backwards counts as due.
        elapsed < 0 || elapsed as u64 >= interval.as_secs()
    }

    pub fn mark_update_checked(&mut self, now: OffsetDateTime) {
        self.last_update_check = Some(now.unix_timestamp());
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

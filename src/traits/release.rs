/// Source of release metadata. Blocking; run on a worker.
pub trait VersionSource: Send + Sync {
    /// `Ok(None)` when no newer version is available.
    fn check_for_new_version(&self) -> anyhow::Result<Option<String>>;
}

/// Installs a release. Blocking; run on a worker.
pub trait Updater: Send + Sync {
    fn update(&self, version: &str) -> anyhow::Result<()>;
}

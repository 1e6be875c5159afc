//! View refresh scheduling.
//!
//! Each view category has a registered loader. A refresh recomputes every
//! requested category, keeps going past individual failures and publishes each
//! fresh view to the UI loop as [`AppEvent::ViewRefreshed`].

use crate::error::{RefreshError, ViewFailure};
use crate::model::{AppEvent, RefreshMode, RefreshRequest, RefreshScope, ViewData, ViewKind};
use crate::traits::ErrorSink;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

/// Requests recomputation of cached view state.
pub trait Refresher: Send + Sync {
    /// In [`RefreshMode::Sync`] the views are recomputed before this returns and any
    /// failure is returned. In [`RefreshMode::Async`] this returns `Ok` at once and
    /// failures are surfaced through the error sink instead.
    fn refresh(&self, request: &RefreshRequest) -> Result<(), RefreshError>;
}

/// Computes one view category. Blocking.
pub trait ViewLoader: Send + Sync {
    fn view(&self) -> ViewKind;
    fn load(&self) -> anyhow::Result<ViewData>;
}

pub struct RefreshScheduler {
    runtime: Handle,
    events: UnboundedSender<AppEvent>,
    errors: Arc<dyn ErrorSink>,
    loaders: BTreeMap<ViewKind, Arc<dyn ViewLoader>>,
}

impl RefreshScheduler {
    pub fn new(
        runtime: Handle,
        events: UnboundedSender<AppEvent>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            runtime,
            events,
            errors,
            loaders: BTreeMap::new(),
        }
    }

    /// Registers `loader` for its category, replacing any previous one.
    pub fn register(&mut self, loader: Arc<dyn ViewLoader>) {
        self.loaders.insert(loader.view(), loader);
    }

    fn loaders_for(&self, scope: &RefreshScope) -> Vec<Arc<dyn ViewLoader>> {
        scope
            .iter()
            .filter_map(|view| self.loaders.get(&view).cloned())
            .collect()
    }
}

impl Refresher for RefreshScheduler {
    fn refresh(&self, request: &RefreshRequest) -> Result<(), RefreshError> {
        let loaders = self.loaders_for(&request.scope);
        if loaders.is_empty() {
            tracing::debug!(scope = ?request.scope, "nothing subscribed to refresh scope");
            return Ok(());
        }

        match request.mode {
            RefreshMode::Sync => recompute(&loaders, &self.events),
            RefreshMode::Async => {
                let events = self.events.clone();
                let errors = Arc::clone(&self.errors);
                self.runtime.spawn_blocking(move || {
                    if let Err(e) = recompute(&loaders, &events) {
                        errors.surface_error(&e.to_string());
                    }
                });
                Ok(())
            }
        }
    }
}

fn recompute(
    loaders: &[Arc<dyn ViewLoader>],
    events: &UnboundedSender<AppEvent>,
) -> Result<(), RefreshError> {
    let mut failures = Vec::new();
    for loader in loaders {
        match loader.load() {
            Ok(data) => {
                let _ = events.send(AppEvent::ViewRefreshed(data));
            }
            Err(e) => {
                tracing::warn!(view = ?loader.view(), "view refresh failed: {e:#}");
                failures.push(ViewFailure {
                    view: loader.view(),
                    message: format!("{e:#}"),
                });
            }
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(RefreshError { failures })
    }
}

//! Diagnostics.
//!
//! `tracing` is used throughout the crate. The frontend owns the terminal, so
//! [`init`] normally points the subscriber at a log file instead of stderr.

use crate::model::AppEvent;
use crate::traits::{ActionLog, ErrorSink};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. With `log_file` set, output is appended
/// there without ANSI colours; otherwise it goes to stderr.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).compact())
                .try_init()?;
        }
    }
    Ok(())
}

pub fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("subdeck").join("subdeck.log"))
}

/// [`ActionLog`] backed by `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActionLog;

impl ActionLog for TracingActionLog {
    fn log_action(&self, label: &str) {
        tracing::info!(target: "subdeck::actions", action = label);
    }

    fn log_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// [`ErrorSink`] that forwards errors to the UI loop.
#[derive(Debug, Clone)]
pub struct ChannelErrorSink {
    events: UnboundedSender<AppEvent>,
}

impl ChannelErrorSink {
    pub fn new(events: UnboundedSender<AppEvent>) -> Self {
        Self { events }
    }
}

impl ErrorSink for ChannelErrorSink {
    fn surface_error(&self, message: &str) {
        if self.events.send(AppEvent::Error(message.to_string())).is_err() {
            // UI loop is gone; keep the message in the log at least.
            tracing::warn!("dropped error after UI shutdown: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_delivers_to_ui_loop() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelErrorSink::new(tx);
        sink.surface_error("fatal: not a git repository");
        assert_eq!(
            rx.try_recv().unwrap(),
            AppEvent::Error("fatal: not a git repository".into())
        );
    }
}

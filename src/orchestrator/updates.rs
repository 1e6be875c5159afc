//! Self-update guard.
//!
//! Owns the update flag and its status entry. A check or an update is a worker
//! job; results come back through [`UpdateOrchestrator::on_job_finished`]. Only one
//! check or update is in flight at a time and an update can only start from a
//! check or from `Idle`.

use super::controller::{Job, WorkerHandle};
use super::prompt::{ChainDriver, ChainProgress, PromptChain, PromptStep};
use crate::config::{UpdateConfig, UpdateMethod};
use crate::i18n::{fill, Translations, UpdateTexts};
use crate::model::{JobAborted, JobOutput, JobTicket};
use crate::status::{StatusId, StatusManager};
use crate::traits::{ActionLog, ErrorSink, PromptView, Updater, VersionSource};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Requested by the user; failures are shown.
    Foreground,
    /// Periodic or at startup; failures are only logged.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePhase {
    #[default]
    Idle,
    CheckingForeground,
    CheckingBackground,
    Updating,
}

/// The update flag and the status shown while it is set. Both change together.
#[derive(Debug, Default)]
pub struct UpdateState {
    updating: bool,
    active_status: Option<StatusId>,
}

impl UpdateState {
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn active_status(&self) -> Option<StatusId> {
        self.active_status
    }

    fn begin(&mut self, status: StatusId) {
        self.updating = true;
        self.active_status = Some(status);
    }

    fn end(&mut self) -> Option<StatusId> {
        self.updating = false;
        self.active_status.take()
    }
}

/// What the session should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStep {
    None,
    Prompt(PromptView),
    ErrorPanel(String),
    Quit,
}

enum Confirmation {
    Download(String),
    QuitWhileUpdating,
}

pub struct UpdateOrchestrator {
    texts: &'static UpdateTexts,
    config: UpdateConfig,
    source: Arc<dyn VersionSource>,
    updater: Arc<dyn Updater>,
    errors: Arc<dyn ErrorSink>,
    log: Arc<dyn ActionLog>,
    workers: WorkerHandle,
    state: UpdateState,
    phase: UpdatePhase,
    job: Option<JobTicket>,
    pending: Option<(ChainDriver, Confirmation)>,
}

impl UpdateOrchestrator {
    pub fn new(
        translations: &'static Translations,
        config: UpdateConfig,
        source: Arc<dyn VersionSource>,
        updater: Arc<dyn Updater>,
        errors: Arc<dyn ErrorSink>,
        log: Arc<dyn ActionLog>,
        workers: WorkerHandle,
    ) -> Self {
        Self {
            texts: &translations.update,
            config,
            source,
            updater,
            errors,
            log,
            workers,
            state: UpdateState::default(),
            phase: UpdatePhase::Idle,
            job: None,
            pending: None,
        }
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn is_updating(&self) -> bool {
        self.state.is_updating()
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    pub fn owns(&self, ticket: JobTicket) -> bool {
        self.job == Some(ticket)
    }

    pub fn job_in_flight(&self) -> bool {
        self.job.is_some()
    }

    pub fn has_pending_prompt(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a version check. Refused unless idle with nothing in flight, and
    /// background checks are refused when the update method is `never`.
    pub fn check_for_update(&mut self, mode: CheckMode) -> bool {
        if self.phase != UpdatePhase::Idle || self.state.is_updating() || self.job.is_some() {
            tracing::debug!(phase = ?self.phase, ?mode, "update check refused");
            return false;
        }
        if mode == CheckMode::Background && self.config.method == UpdateMethod::Never {
            return false;
        }

        let ticket = self.workers.next_ticket();
        let source = Arc::clone(&self.source);
        let job = Job::new(ticket, "check for update", move || {
            JobOutput::VersionCheck(source.check_for_new_version().map_err(|e| format!("{e:#}")))
        });
        if self.workers.submit(job).is_err() {
            self.report(mode, "worker pool is not running");
            return false;
        }

        self.job = Some(ticket);
        self.phase = match mode {
            CheckMode::Foreground => UpdatePhase::CheckingForeground,
            CheckMode::Background => UpdatePhase::CheckingBackground,
        };
        true
    }

    /// Begins installing `version`. Refused while another update or a check is
    /// running, or while a download confirmation is still open.
    pub fn start_updating(&mut self, version: &str, status: &mut StatusManager) -> bool {
        if self.state.is_updating() || self.job.is_some() {
            tracing::debug!(version, "update already in progress");
            return false;
        }
        if matches!(self.pending, Some((_, Confirmation::Download(_)))) {
            tracing::debug!(version, "download confirmation still open");
            return false;
        }

        let ticket = self.workers.next_ticket();
        let updater = Arc::clone(&self.updater);
        let target = version.to_string();
        let job = Job::new(ticket, format!("update to {version}"), move || {
            JobOutput::Update(updater.update(&target).map_err(|e| format!("{e:#}")))
        });

        let status_id = status.add_waiting_status(self.texts.updating_status);
        if self.workers.submit(job).is_err() {
            status.remove_status(status_id);
            self.phase = UpdatePhase::Idle;
            self.errors.surface_error("worker pool is not running");
            return false;
        }

        tracing::info!(version, "updating");
        self.state.begin(status_id);
        self.phase = UpdatePhase::Updating;
        self.job = Some(ticket);
        true
    }

    /// Settles a finished check or update job. Unknown tickets are ignored.
    pub fn on_job_finished(
        &mut self,
        ticket: JobTicket,
        result: Result<JobOutput, JobAborted>,
        status: &mut StatusManager,
    ) -> UpdateStep {
        if !self.owns(ticket) {
            return UpdateStep::None;
        }
        self.job = None;

        match self.phase {
            UpdatePhase::CheckingForeground => {
                self.on_check_finished(CheckMode::Foreground, result, status)
            }
            UpdatePhase::CheckingBackground => {
                self.on_check_finished(CheckMode::Background, result, status)
            }
            UpdatePhase::Updating => self.on_update_finished(result, status),
            UpdatePhase::Idle => UpdateStep::None,
        }
    }

    /// Accepts the open confirmation.
    pub fn submit(&mut self, status: &mut StatusManager) -> UpdateStep {
        let Some((mut driver, confirmation)) = self.pending.take() else {
            return UpdateStep::None;
        };
        match driver.submit("") {
            ChainProgress::Prompt(view) => {
                self.pending = Some((driver, confirmation));
                UpdateStep::Prompt(view)
            }
            ChainProgress::Cancelled => UpdateStep::None,
            ChainProgress::Complete(_) => match confirmation {
                Confirmation::Download(version) => {
                    if !self.state.is_updating() {
                        self.phase = UpdatePhase::Idle;
                    }
                    self.start_updating(&version, status);
                    UpdateStep::None
                }
                Confirmation::QuitWhileUpdating => UpdateStep::Quit,
            },
        }
    }

    /// Declines the open confirmation. Declining a download returns to idle;
    /// declining the quit prompt leaves the update running.
    pub fn cancel(&mut self) -> UpdateStep {
        if let Some((mut driver, confirmation)) = self.pending.take() {
            driver.cancel();
            if matches!(confirmation, Confirmation::Download(_)) && !self.state.is_updating() {
                self.phase = UpdatePhase::Idle;
            }
        }
        UpdateStep::None
    }

    /// Quit straight away unless an update is running, in which case ask first.
    pub fn request_quit(&mut self) -> UpdateStep {
        if !self.state.is_updating() {
            return UpdateStep::Quit;
        }
        if self.pending.is_some() {
            return UpdateStep::None;
        }
        let chain = PromptChain::new().then(PromptStep::confirm(
            self.texts.quit_title,
            self.texts.quit_prompt,
        ));
        self.ask(chain, Confirmation::QuitWhileUpdating)
    }

    fn on_check_finished(
        &mut self,
        mode: CheckMode,
        result: Result<JobOutput, JobAborted>,
        status: &mut StatusManager,
    ) -> UpdateStep {
        let checked = match result {
            Ok(JobOutput::VersionCheck(checked)) => checked,
            Ok(other) => Err(format!("unexpected job output {other:?}")),
            Err(aborted) => Err(aborted.message),
        };

        match checked {
            Err(message) => {
                self.phase = UpdatePhase::Idle;
                self.report(mode, &message);
                UpdateStep::None
            }
            Ok(None) => {
                self.phase = UpdatePhase::Idle;
                match mode {
                    CheckMode::Foreground => {
                        UpdateStep::ErrorPanel(self.texts.not_found.to_string())
                    }
                    CheckMode::Background => UpdateStep::None,
                }
            }
            Ok(Some(version))
                if mode == CheckMode::Background
                    && self.config.method == UpdateMethod::Background =>
            {
                self.phase = UpdatePhase::Idle;
                self.start_updating(&version, status);
                UpdateStep::None
            }
            Ok(Some(version)) => {
                let chain = PromptChain::new().then(PromptStep::confirm(
                    self.texts.new_version_title,
                    fill(self.texts.download_prompt, &version),
                ));
                self.ask(chain, Confirmation::Download(version))
            }
        }
    }

    fn on_update_finished(
        &mut self,
        result: Result<JobOutput, JobAborted>,
        status: &mut StatusManager,
    ) -> UpdateStep {
        if let Some(id) = self.state.end() {
            status.remove_status(id);
        }
        self.phase = UpdatePhase::Idle;

        let message = match result {
            Ok(JobOutput::Update(Ok(()))) => {
                tracing::info!("update finished");
                return UpdateStep::None;
            }
            Ok(JobOutput::Update(Err(message))) => message,
            Ok(other) => format!("unexpected job output {other:?}"),
            Err(aborted) => aborted.message,
        };
        tracing::warn!("update failed: {message}");
        UpdateStep::ErrorPanel(fill(self.texts.update_failed, &message))
    }

    fn ask(&mut self, chain: PromptChain, confirmation: Confirmation) -> UpdateStep {
        let (driver, progress) = ChainDriver::start(chain);
        match progress {
            ChainProgress::Prompt(view) => {
                self.pending = Some((driver, confirmation));
                UpdateStep::Prompt(view)
            }
            _ => UpdateStep::None,
        }
    }

    fn report(&self, mode: CheckMode, message: &str) {
        match mode {
            CheckMode::Foreground => self.errors.surface_error(message),
            CheckMode::Background => self
                .log
                .log_error(&format!("background update check failed: {message}")),
        }
    }
}

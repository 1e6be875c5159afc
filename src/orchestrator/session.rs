//! UI-loop side of the orchestration core.
//!
//! A [`Session`] lives on the thread that renders and reads input. It is the only
//! writer of the status registry, the update state and the cached views; workers
//! report back through [`AppEvent`]s that the frontend feeds to
//! [`Session::handle_event`].

use super::coordinator::{Action, ActionCoordinator, ActionStep, Menu};
use super::controller::WorkerHandle;
use super::refresh::Refresher;
use super::submodules::SubmoduleLifecycleController;
use super::updates::{CheckMode, UpdateOrchestrator, UpdatePhase, UpdateStep};
use crate::config::{AppState, UpdateConfig, UpdateMethod};
use crate::error::RefreshError;
use crate::i18n::Translations;
use crate::model::{
    AppEvent, RefreshRequest, RefreshScope, Submodule, ViewData, ViewKind, WorkingFile,
};
use crate::status::StatusManager;
use crate::traits::{
    ActionLog, CommandExecutor, ErrorSink, Presenter, PromptView, SubmoduleNavigator, Updater,
    VersionSource,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;

/// Everything the session needs from the frontend.
pub struct Collaborators {
    pub executor: Arc<dyn CommandExecutor>,
    pub refresher: Arc<dyn Refresher>,
    pub errors: Arc<dyn ErrorSink>,
    pub log: Arc<dyn ActionLog>,
    pub versions: Arc<dyn VersionSource>,
    pub updater: Arc<dyn Updater>,
    pub presenter: Box<dyn Presenter>,
    pub navigator: Box<dyn SubmoduleNavigator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Quit,
}

/// Which component answers the modal on screen.
enum Modal {
    Action,
    Update,
    Menu(Vec<Action>),
}

#[derive(Debug, Default)]
struct RepoCache {
    submodules: Vec<Submodule>,
    files: Vec<WorkingFile>,
    selected: Option<usize>,
}

impl RepoCache {
    fn selected(&self) -> Option<&Submodule> {
        self.selected.and_then(|i| self.submodules.get(i))
    }

    fn replace_submodules(&mut self, submodules: Vec<Submodule>) {
        let previous = self.selected().map(|s| s.name.clone());
        let index = previous
            .and_then(|name| submodules.iter().position(|s| s.name == name))
            .or_else(|| self.selected.map(|i| i.min(submodules.len().saturating_sub(1))))
            .or(Some(0));
        self.selected = index.filter(|_| !submodules.is_empty());
        self.submodules = submodules;
    }
}

pub struct Session {
    presenter: Box<dyn Presenter>,
    navigator: Box<dyn SubmoduleNavigator>,
    refresher: Arc<dyn Refresher>,
    status: StatusManager,
    coordinator: ActionCoordinator,
    submodules: SubmoduleLifecycleController,
    updates: UpdateOrchestrator,
    repo: RepoCache,
    modal: Option<Modal>,
    deferred: VecDeque<PromptView>,
    app_state: AppState,
    state_path: Option<PathBuf>,
}

impl Session {
    /// `state_path` is where [`AppState`] is saved after each scheduled check; `None`
    /// keeps it in memory only.
    pub fn new(
        collaborators: Collaborators,
        workers: WorkerHandle,
        translations: &'static Translations,
        update_config: UpdateConfig,
        app_state: AppState,
        state_path: Option<PathBuf>,
    ) -> Self {
        let Collaborators {
            executor,
            refresher,
            errors,
            log,
            versions,
            updater,
            presenter,
            navigator,
        } = collaborators;

        Self {
            presenter,
            navigator,
            coordinator: ActionCoordinator::new(
                Arc::clone(&executor),
                Arc::clone(&refresher),
                Arc::clone(&errors),
                Arc::clone(&log),
                workers.clone(),
            ),
            submodules: SubmoduleLifecycleController::new(translations, executor),
            updates: UpdateOrchestrator::new(
                translations,
                update_config,
                versions,
                updater,
                errors,
                log,
                workers,
            ),
            refresher,
            status: StatusManager::new(),
            repo: RepoCache::default(),
            modal: None,
            deferred: VecDeque::new(),
            app_state,
            state_path,
        }
    }

    pub fn status_text(&self) -> &str {
        self.status.current_status_text()
    }

    pub fn status_line(&self, tick: usize) -> String {
        self.status.status_line(tick)
    }

    pub fn submodules(&self) -> &[Submodule] {
        &self.repo.submodules
    }

    pub fn files(&self) -> &[WorkingFile] {
        &self.repo.files
    }

    pub fn selected_submodule(&self) -> Option<&Submodule> {
        self.repo.selected()
    }

    /// Returns `false` when `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.repo.submodules.len() {
            return false;
        }
        self.repo.selected = Some(index);
        true
    }

    pub fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    pub fn has_work_in_flight(&self) -> bool {
        self.coordinator.in_flight_count() > 0 || self.updates.job_in_flight()
    }

    pub fn is_updating(&self) -> bool {
        self.updates.is_updating()
    }

    pub fn update_phase(&self) -> UpdatePhase {
        self.updates.phase()
    }

    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    /// Recomputes every view before returning. Used at startup.
    pub fn refresh_views(&self) -> Result<(), RefreshError> {
        let scope = RefreshScope::of(ViewKind::Submodules).with(ViewKind::Files);
        self.refresher.refresh(&RefreshRequest::sync(scope))
    }

    /// Returns `Ok(false)` when nothing is selected or a modal is open.
    pub fn enter_submodule(&mut self) -> anyhow::Result<bool> {
        if self.modal.is_some() {
            return Ok(false);
        }
        self.submodules.enter(self.repo.selected(), self.navigator.as_mut())
    }

    pub fn add_submodule(&mut self) {
        let action = self.submodules.add();
        self.start(Some(action));
    }

    pub fn edit_submodule_url(&mut self) {
        let action = self.submodules.edit_url(self.repo.selected());
        self.start(action);
    }

    pub fn init_submodule(&mut self) {
        let action = self.submodules.init(self.repo.selected());
        self.start(action);
    }

    pub fn update_submodule(&mut self) {
        let action = self.submodules.update(self.repo.selected());
        self.start(action);
    }

    pub fn open_reset_menu(&mut self) {
        let menu = self.submodules.reset_menu(self.repo.selected(), &self.repo.files);
        self.open_menu(menu);
    }

    pub fn open_bulk_menu(&mut self) {
        let menu = self.submodules.bulk_menu(&self.repo.submodules);
        self.open_menu(Some(menu));
    }

    /// User-initiated check. Failures are shown.
    pub fn check_for_update(&mut self) -> bool {
        if self.modal.is_some() {
            return false;
        }
        self.updates.check_for_update(CheckMode::Foreground)
    }

    pub fn check_for_update_in_background(&mut self) -> bool {
        self.updates.check_for_update(CheckMode::Background)
    }

    /// Starts a background check when one is due, then records the check time.
    pub fn tick(&mut self, now: OffsetDateTime) -> bool {
        let config = self.updates.config();
        if config.method == UpdateMethod::Never
            || !self.app_state.update_check_due(config.check_interval, now)
        {
            return false;
        }
        tracing::debug!(
            interval = %humantime::format_duration(config.check_interval),
            "background update check due"
        );
        if !self.updates.check_for_update(CheckMode::Background) {
            return false;
        }

        self.app_state.mark_update_checked(now);
        if let Some(path) = &self.state_path {
            if let Err(e) = self.app_state.save(path) {
                tracing::warn!("failed to save app state: {e:#}");
            }
        }
        true
    }

    /// Answers whatever prompt is on screen.
    pub fn submit_prompt(&mut self, input: &str) -> Signal {
        match self.modal {
            Some(Modal::Action) => {
                let step = self.coordinator.submit(input, &mut self.status);
                self.after_action_step(step);
                Signal::Continue
            }
            Some(Modal::Update) => {
                let step = self.updates.submit(&mut self.status);
                if let UpdateStep::Prompt(view) = &step {
                    self.presenter.show_prompt(view);
                    return Signal::Continue;
                }
                self.close_modal();
                self.present_update(step)
            }
            Some(Modal::Menu(_)) | None => Signal::Continue,
        }
    }

    /// Dismisses the open prompt or menu without invoking anything.
    pub fn cancel_prompt(&mut self) {
        match self.modal {
            Some(Modal::Action) => {
                self.coordinator.cancel();
            }
            Some(Modal::Update) => {
                self.updates.cancel();
            }
            Some(Modal::Menu(_)) => {}
            None => return,
        }
        self.close_modal();
    }

    /// Runs the `index`th item of the open menu.
    pub fn select_menu_item(&mut self, index: usize) {
        let actions = match self.modal.take() {
            Some(Modal::Menu(actions)) if index < actions.len() => actions,
            other => {
                self.modal = other;
                return;
            }
        };
        self.presenter.close();
        self.start(actions.into_iter().nth(index));
        if self.modal.is_none() {
            self.show_deferred();
        }
    }

    /// Quits unless an update is running, in which case the user is asked first.
    pub fn request_quit(&mut self) -> Signal {
        if self.modal.is_some() {
            return Signal::Continue;
        }
        let step = self.updates.request_quit();
        self.present_update(step)
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Signal {
        match event {
            AppEvent::JobFinished { ticket, result } => {
                if self.coordinator.owns(ticket) {
                    let outcome = self.coordinator.finish(ticket, result, &mut self.status);
                    if let Some(outcome) = outcome {
                        tracing::debug!(?outcome, "action settled");
                    }
                    Signal::Continue
                } else if self.updates.owns(ticket) {
                    let step = self.updates.on_job_finished(ticket, result, &mut self.status);
                    self.present_update(step)
                } else {
                    tracing::debug!(?ticket, "completion for unknown job");
                    Signal::Continue
                }
            }
            AppEvent::ViewRefreshed(ViewData::Submodules(submodules)) => {
                self.repo.replace_submodules(submodules);
                Signal::Continue
            }
            AppEvent::ViewRefreshed(ViewData::Files(files)) => {
                self.repo.files = files;
                Signal::Continue
            }
            AppEvent::Error(message) => {
                self.presenter.error_panel(&message);
                Signal::Continue
            }
        }
    }

    fn start(&mut self, action: Option<Action>) {
        let Some(action) = action else {
            tracing::debug!("no submodule selected");
            return;
        };
        if self.modal.is_some() {
            tracing::debug!(action = action.log_label(), "modal open; ignoring");
            return;
        }
        let step = self.coordinator.run_action(action, &mut self.status);
        self.after_action_step(step);
    }

    fn after_action_step(&mut self, step: ActionStep) {
        match step {
            ActionStep::Prompt(view) => {
                self.modal = Some(Modal::Action);
                self.presenter.show_prompt(&view);
            }
            ActionStep::Launched(_) | ActionStep::Cancelled | ActionStep::Busy => {
                if matches!(self.modal, Some(Modal::Action)) {
                    self.close_modal();
                }
            }
        }
    }

    fn open_menu(&mut self, menu: Option<Menu>) {
        let Some(menu) = menu else {
            return;
        };
        if self.modal.is_some() {
            return;
        }
        let (view, actions) = menu.split();
        self.modal = Some(Modal::Menu(actions));
        self.presenter.show_menu(&view);
    }

    fn present_update(&mut self, step: UpdateStep) -> Signal {
        match step {
            UpdateStep::None => {}
            UpdateStep::Prompt(view) => {
                if self.modal.is_some() {
                    self.deferred.push_back(view);
                } else {
                    self.modal = Some(Modal::Update);
                    self.presenter.show_prompt(&view);
                }
            }
            UpdateStep::ErrorPanel(message) => self.presenter.error_panel(&message),
            UpdateStep::Quit => return Signal::Quit,
        }
        Signal::Continue
    }

    fn close_modal(&mut self) {
        self.modal = None;
        self.presenter.close();
        self.show_deferred();
    }

    fn show_deferred(&mut self) {
        if let Some(view) = self.deferred.pop_front() {
            self.modal = Some(Modal::Update);
            self.presenter.show_prompt(&view);
        }
    }
}

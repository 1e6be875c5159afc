#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subdeck::config::{AppState, UpdateConfig};
use subdeck::error::{CommandError, RefreshError, ViewFailure};
use subdeck::i18n::EN_US;
use subdeck::orchestrator::{
    run_controller, Collaborators, Refresher, Session, Signal, WorkerHandle,
};
use subdeck::traits::{
    ActionLog, CommandExecutor, ErrorSink, GitIntent, MenuView, Presenter, PromptView,
    SubmoduleNavigator, Updater, VersionSource,
};
use subdeck::model::ViewData;
use subdeck::{AppEvent, RefreshRequest, Submodule, ViewKind, WorkingFile};
use tokio::sync::mpsc::{self, UnboundedReceiver};

#[derive(Default)]
pub struct RecordingExecutor {
    runs: Mutex<Vec<GitIntent>>,
    failing: Mutex<Vec<GitIntent>>,
}

impl RecordingExecutor {
    pub fn runs(&self) -> Vec<GitIntent> {
        self.runs.lock().unwrap().clone()
    }

    pub fn fail_on(&self, intent: GitIntent) {
        self.failing.lock().unwrap().push(intent);
    }
}

impl CommandExecutor for RecordingExecutor {
    fn command_string(&self, intent: &GitIntent) -> String {
        match intent {
            GitIntent::BulkInit => "git submodule init".into(),
            GitIntent::BulkUpdate => "git submodule update".into(),
            GitIntent::ForceBulkUpdate => "git submodule update --force".into(),
            GitIntent::BulkDeinit => "git submodule deinit --all --force".into(),
            GitIntent::DeleteSubmodule { path, .. } => format!("git rm --force {path}"),
            other => format!("{other:?}"),
        }
    }

    fn run(&self, intent: &GitIntent) -> Result<(), CommandError> {
        self.runs.lock().unwrap().push(intent.clone());
        if self.failing.lock().unwrap().contains(intent) {
            return Err(CommandError::new(self.command_string(intent), "fatal: exit status 128"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingRefresher {
    requests: Mutex<Vec<RefreshRequest>>,
    failing: Mutex<Option<ViewKind>>,
}

impl RecordingRefresher {
    pub fn requests(&self) -> Vec<RefreshRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail_view(&self, view: ViewKind) {
        *self.failing.lock().unwrap() = Some(view);
    }
}

impl Refresher for RecordingRefresher {
    fn refresh(&self, request: &RefreshRequest) -> Result<(), RefreshError> {
        self.requests.lock().unwrap().push(request.clone());
        match *self.failing.lock().unwrap() {
            Some(view) if request.scope.contains(view) => Err(RefreshError {
                failures: vec![ViewFailure {
                    view,
                    message: "index.lock exists".into(),
                }],
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    surfaced: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn surfaced(&self) -> Vec<String> {
        self.surfaced.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    fn surface_error(&self, message: &str) {
        self.surfaced.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingLog {
    actions: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl ActionLog for RecordingLog {
    fn log_action(&self, label: &str) {
        self.actions.lock().unwrap().push(label.to_string());
    }

    fn log_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub struct FakeVersions {
    result: Mutex<Result<Option<String>, String>>,
}

impl FakeVersions {
    pub fn set(&self, result: Result<Option<String>, String>) {
        *self.result.lock().unwrap() = result;
    }
}

impl Default for FakeVersions {
    fn default() -> Self {
        Self {
            result: Mutex::new(Ok(None)),
        }
    }
}

impl VersionSource for FakeVersions {
    fn check_for_new_version(&self) -> anyhow::Result<Option<String>> {
        self.result.lock().unwrap().clone().map_err(anyhow::Error::msg)
    }
}

#[derive(Default)]
pub struct FakeUpdater {
    installs: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

impl FakeUpdater {
    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().unwrap().clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

impl Updater for FakeUpdater {
    fn update(&self, version: &str) -> anyhow::Result<()> {
        self.installs.lock().unwrap().push(version.to_string());
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }
}

/// What the presenter was asked to show, in order.
#[derive(Debug, Default)]
pub struct Shown {
    pub prompts: Vec<PromptView>,
    pub menus: Vec<MenuView>,
    pub panels: Vec<String>,
    pub closes: usize,
}

pub struct RecordingPresenter(Rc<RefCell<Shown>>);

impl Presenter for RecordingPresenter {
    fn show_prompt(&mut self, view: &PromptView) {
        self.0.borrow_mut().prompts.push(view.clone());
    }

    fn show_menu(&mut self, view: &MenuView) {
        self.0.borrow_mut().menus.push(view.clone());
    }

    fn close(&mut self) {
        self.0.borrow_mut().closes += 1;
    }

    fn error_panel(&mut self, message: &str) {
        self.0.borrow_mut().panels.push(message.to_string());
    }
}

pub struct RecordingNavigator(Rc<RefCell<Vec<String>>>);

impl SubmoduleNavigator for RecordingNavigator {
    fn enter_submodule(&mut self, submodule: &Submodule) -> anyhow::Result<()> {
        self.0.borrow_mut().push(submodule.name.clone());
        Ok(())
    }
}

pub struct Harness {
    pub session: Session,
    pub executor: Arc<RecordingExecutor>,
    pub refresher: Arc<RecordingRefresher>,
    pub sink: Arc<RecordingSink>,
    pub log: Arc<RecordingLog>,
    pub versions: Arc<FakeVersions>,
    pub updater: Arc<FakeUpdater>,
    pub shown: Rc<RefCell<Shown>>,
    pub entered: Rc<RefCell<Vec<String>>>,
    pub workers: WorkerHandle,
    events: UnboundedReceiver<AppEvent>,
}

impl Harness {
    /// Must be called from inside a tokio runtime; the worker loop is spawned onto it.
    pub fn new(update: UpdateConfig) -> Self {
        Self::with_state(update, AppState::default(), None)
    }

    pub fn with_state(
        update: UpdateConfig,
        state: AppState,
        state_path: Option<std::path::PathBuf>,
    ) -> Self {
        let (workers, cmd_rx) = WorkerHandle::channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        tokio::spawn(run_controller(cmd_rx, event_tx));

        let executor = Arc::new(RecordingExecutor::default());
        let refresher = Arc::new(RecordingRefresher::default());
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let versions = Arc::new(FakeVersions::default());
        let updater = Arc::new(FakeUpdater::default());
        let shown = Rc::new(RefCell::new(Shown::default()));
        let entered = Rc::new(RefCell::new(Vec::new()));

        let collaborators = Collaborators {
            executor: executor.clone(),
            refresher: refresher.clone(),
            errors: sink.clone(),
            log: log.clone(),
            versions: versions.clone(),
            updater: updater.clone(),
            presenter: Box::new(RecordingPresenter(shown.clone())),
            navigator: Box::new(RecordingNavigator(entered.clone())),
        };
        let session = Session::new(
            collaborators,
            workers.clone(),
            &EN_US,
            update,
            state,
            state_path,
        );

        Self {
            session,
            executor,
            refresher,
            sink,
            log,
            versions,
            updater,
            shown,
            entered,
            workers,
            events,
        }
    }

    /// Loads the submodule and file views as if a refresh had just completed.
    pub fn seed(&mut self, submodules: Vec<Submodule>, files: Vec<WorkingFile>) {
        self.session.handle_event(AppEvent::ViewRefreshed(ViewData::Submodules(submodules)));
        self.session.handle_event(AppEvent::ViewRefreshed(ViewData::Files(files)));
    }

    pub async fn next_event(&mut self) -> AppEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for worker")
            .expect("event channel closed")
    }

    /// Feeds completions back into the session until no job is in flight.
    pub async fn settle(&mut self) -> Signal {
        let mut signal = Signal::Continue;
        while self.session.has_work_in_flight() {
            let event = self.next_event().await;
            if self.session.handle_event(event) == Signal::Quit {
                signal = Signal::Quit;
            }
        }
        signal
    }

    pub fn last_prompt(&self) -> PromptView {
        self.shown.borrow().prompts.last().cloned().expect("no prompt shown")
    }

    pub fn prompt_count(&self) -> usize {
        self.shown.borrow().prompts.len()
    }

    pub fn panels(&self) -> Vec<String> {
        self.shown.borrow().panels.clone()
    }
}

pub fn lib_submodule() -> Submodule {
    Submodule::new("lib", "vendor/lib", "https://example.com/lib.git")
}

pub fn docs_submodule() -> Submodule {
    Submodule::new("docs", "docs", "https://example.com/docs.git")
}

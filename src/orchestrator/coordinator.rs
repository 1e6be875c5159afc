//! Generic action pipeline.
//!
//! prompt chain → waiting status → mutation on a worker → error surfacing →
//! refresh. The prompt half runs on the UI loop; everything after the last
//! answer runs inside one worker job, and the status is released when that job's
//! completion arrives back on the UI loop, whatever the result.

use super::controller::{Job, WorkerHandle};
use super::prompt::{ChainDriver, ChainProgress, PromptChain};
use super::refresh::Refresher;
use crate::error::ActionError;
use crate::model::{ActionOutcome, JobAborted, JobOutput, JobTicket, RefreshRequest};
use crate::status::{StatusId, StatusManager};
use crate::traits::{
    ActionLog, CommandExecutor, ErrorSink, GitIntent, MenuItemView, MenuView, PromptView,
};
use std::collections::HashMap;
use std::sync::Arc;

/// What happens after a mutation step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Surface the error and still refresh, so the UI catches up with any
    /// partial effect.
    #[default]
    Reconcile,
    /// Surface the error and stop without refreshing.
    Abort,
}

/// Yields `None` when the answers do not fit the action.
type Build = Box<dyn FnOnce(&[String]) -> Option<Vec<GitIntent>>>;

/// One user-level operation: prompts, the intents built from the answers, and
/// what to refresh afterwards.
pub struct Action {
    log_label: String,
    status_label: String,
    chain: PromptChain,
    build: Build,
    on_failure: FailurePolicy,
    refresh: Option<RefreshRequest>,
}

impl Action {
    /// An action whose intents do not depend on any prompt answers.
    pub fn new(
        log_label: impl Into<String>,
        status_label: impl Into<String>,
        steps: Vec<GitIntent>,
    ) -> Self {
        Self::from_answers(log_label, status_label, move |_| Some(steps))
    }

    /// An action whose intents are built from the answers to its prompt chain.
    pub fn from_answers(
        log_label: impl Into<String>,
        status_label: impl Into<String>,
        build: impl FnOnce(&[String]) -> Option<Vec<GitIntent>> + 'static,
    ) -> Self {
        Self {
            log_label: log_label.into(),
            status_label: status_label.into(),
            chain: PromptChain::new(),
            build: Box::new(build),
            on_failure: FailurePolicy::Reconcile,
            refresh: None,
        }
    }

    #[must_use]
    pub fn prompts(mut self, chain: PromptChain) -> Self {
        self.chain = chain;
        self
    }

    #[must_use]
    pub fn abort_on_failure(mut self) -> Self {
        self.on_failure = FailurePolicy::Abort;
        self
    }

    #[must_use]
    pub fn refresh(mut self, request: RefreshRequest) -> Self {
        self.refresh = Some(request);
        self
    }

    pub fn log_label(&self) -> &str {
        &self.log_label
    }

    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.on_failure
    }

    pub fn refresh_request(&self) -> Option<&RefreshRequest> {
        self.refresh.as_ref()
    }

    pub fn prompt_count(&self) -> usize {
        self.chain.len()
    }

    /// Consumes the action and returns the intents it would run for `answers`.
    pub fn into_intents(self, answers: &[String]) -> Option<Vec<GitIntent>> {
        (self.build)(answers)
    }
}

pub struct MenuItem {
    pub labels: Vec<String>,
    pub action: Action,
}

impl MenuItem {
    pub fn new(labels: Vec<String>, action: Action) -> Self {
        Self { labels, action }
    }
}

pub struct Menu {
    pub title: String,
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn view(&self) -> MenuView {
        MenuView {
            title: self.title.clone(),
            items: self
                .items
                .iter()
                .map(|i| MenuItemView {
                    labels: i.labels.clone(),
                })
                .collect(),
        }
    }

    /// Splits the menu into what is shown and what each item runs, index for index.
    pub fn split(self) -> (MenuView, Vec<Action>) {
        let view = self.view();
        let actions = self.items.into_iter().map(|i| i.action).collect();
        (view, actions)
    }
}

/// Where an action stands after a call into the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStep {
    /// Waiting on the user for this prompt.
    Prompt(PromptView),
    /// Running on a worker; completion arrives as `AppEvent::JobFinished`.
    Launched(JobTicket),
    Cancelled,
    /// Another action's prompt chain is still open.
    Busy,
}

struct Launch {
    log_label: String,
    status_label: String,
    build: Build,
    on_failure: FailurePolicy,
    refresh: Option<RefreshRequest>,
}

struct PendingAction {
    driver: ChainDriver,
    launch: Launch,
}

#[derive(Debug)]
struct InFlight {
    status: StatusId,
    label: String,
}

pub struct ActionCoordinator {
    executor: Arc<dyn CommandExecutor>,
    refresher: Arc<dyn Refresher>,
    errors: Arc<dyn ErrorSink>,
    log: Arc<dyn ActionLog>,
    workers: WorkerHandle,
    pending: Option<PendingAction>,
    in_flight: HashMap<JobTicket, InFlight>,
}

impl ActionCoordinator {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        refresher: Arc<dyn Refresher>,
        errors: Arc<dyn ErrorSink>,
        log: Arc<dyn ActionLog>,
        workers: WorkerHandle,
    ) -> Self {
        Self {
            executor,
            refresher,
            errors,
            log,
            workers,
            pending: None,
            in_flight: HashMap::new(),
        }
    }

    /// Starts `action`. An action without prompts launches straight away.
    pub fn run_action(&mut self, action: Action, status: &mut StatusManager) -> ActionStep {
        if self.pending.is_some() {
            tracing::debug!(action = %action.log_label, "prompt chain already open; ignoring");
            return ActionStep::Busy;
        }
        let Action {
            log_label,
            status_label,
            chain,
            build,
            on_failure,
            refresh,
        } = action;
        let launch = Launch {
            log_label,
            status_label,
            build,
            on_failure,
            refresh,
        };
        let (driver, progress) = ChainDriver::start(chain);
        self.advance(PendingAction { driver, launch }, progress, status)
    }

    /// Answers the open prompt.
    pub fn submit(&mut self, input: &str, status: &mut StatusManager) -> ActionStep {
        let Some(mut pending) = self.pending.take() else {
            return ActionStep::Cancelled;
        };
        let progress = pending.driver.submit(input);
        self.advance(pending, progress, status)
    }

    /// Abandons the open prompt chain. Nothing runs and nothing is refreshed.
    pub fn cancel(&mut self) -> ActionStep {
        if let Some(mut pending) = self.pending.take() {
            tracing::debug!(action = %pending.launch.log_label, "action cancelled");
            pending.driver.cancel();
        }
        ActionStep::Cancelled
    }

    pub fn has_pending_prompt(&self) -> bool {
        self.pending.is_some()
    }

    pub fn owns(&self, ticket: JobTicket) -> bool {
        self.in_flight.contains_key(&ticket)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Settles a finished job: releases its status and returns the outcome.
    ///
    /// Mutation and refresh errors were already surfaced on the worker; only a job
    /// that never ran to completion is surfaced here. Returns `None` for tickets this
    /// coordinator did not issue.
    pub fn finish(
        &mut self,
        ticket: JobTicket,
        result: Result<JobOutput, JobAborted>,
        status: &mut StatusManager,
    ) -> Option<ActionOutcome> {
        let in_flight = self.in_flight.remove(&ticket)?;
        status.remove_status(in_flight.status);

        let outcome = match result {
            Ok(JobOutput::Action(outcome)) => outcome,
            Ok(other) => {
                tracing::warn!(action = %in_flight.label, "unexpected job output {other:?}");
                ActionOutcome::Failed(ActionError::Aborted("unexpected job output".into()))
            }
            Err(aborted) => {
                let err = ActionError::Aborted(aborted.message);
                self.errors.surface_error(&err.to_string());
                ActionOutcome::Failed(err)
            }
        };
        tracing::debug!(
            action = %in_flight.label,
            success = outcome.is_success(),
            "action finished"
        );
        Some(outcome)
    }

    fn advance(
        &mut self,
        mut pending: PendingAction,
        progress: ChainProgress,
        status: &mut StatusManager,
    ) -> ActionStep {
        match progress {
            ChainProgress::Prompt(view) => {
                self.pending = Some(pending);
                ActionStep::Prompt(view)
            }
            ChainProgress::Cancelled => {
                pending.driver.cancel();
                ActionStep::Cancelled
            }
            ChainProgress::Complete(answers) => self.launch(pending.launch, &answers, status),
        }
    }

    fn launch(
        &mut self,
        launch: Launch,
        answers: &[String],
        status: &mut StatusManager,
    ) -> ActionStep {
        let Launch {
            log_label,
            status_label,
            build,
            on_failure,
            refresh,
        } = launch;
        let Some(steps) = build(answers) else {
            tracing::warn!(action = %log_label, answers = answers.len(), "answers rejected");
            self.errors
                .surface_error(&format!("{log_label}: unexpected prompt answers"));
            return ActionStep::Cancelled;
        };

        let status_id = status.add_waiting_status(status_label);
        let ticket = self.workers.next_ticket();
        let work = ActionWork {
            label: log_label.clone(),
            steps,
            on_failure,
            refresh,
            executor: Arc::clone(&self.executor),
            refresher: Arc::clone(&self.refresher),
            errors: Arc::clone(&self.errors),
            log: Arc::clone(&self.log),
        };

        if self
            .workers
            .submit(Job::new(ticket, log_label.clone(), move || work.execute()))
            .is_err()
        {
            status.remove_status(status_id);
            self.errors.surface_error("worker pool is not running");
            return ActionStep::Cancelled;
        }

        self.in_flight.insert(
            ticket,
            InFlight {
                status: status_id,
                label: log_label,
            },
        );
        ActionStep::Launched(ticket)
    }
}

/// The part of an action that runs on a worker.
struct ActionWork {
    label: String,
    steps: Vec<GitIntent>,
    on_failure: FailurePolicy,
    refresh: Option<RefreshRequest>,
    executor: Arc<dyn CommandExecutor>,
    refresher: Arc<dyn Refresher>,
    errors: Arc<dyn ErrorSink>,
    log: Arc<dyn ActionLog>,
}

impl ActionWork {
    fn execute(self) -> JobOutput {
        self.log.log_action(&self.label);

        let mut mutation = None;
        for step in &self.steps {
            if let Err(e) = self.executor.run(step) {
                tracing::warn!(action = %self.label, command = %e.command, "command failed: {e}");
                self.errors.surface_error(&e.to_string());
                mutation = Some(e);
                break;
            }
        }

        if let (Some(e), FailurePolicy::Abort) = (&mutation, self.on_failure) {
            return JobOutput::Action(ActionOutcome::Failed(ActionError::Mutation(e.clone())));
        }

        let refreshed = match &self.refresh {
            Some(request) => self.refresher.refresh(request),
            None => Ok(()),
        };
        if let Err(e) = &refreshed {
            self.errors.surface_error(&e.to_string());
        }

        let outcome = match (mutation, refreshed) {
            (Some(e), _) => ActionOutcome::Failed(ActionError::Mutation(e)),
            (None, Err(e)) => ActionOutcome::Failed(ActionError::Refresh(e)),
            (None, Ok(())) => ActionOutcome::Succeeded,
        };
        JobOutput::Action(outcome)
    }
}

//! Background worker loop.
//!
//! Receives jobs from the UI loop, runs each on the blocking pool and reports
//! completion as an [`AppEvent`]. Nothing here touches UI-owned state.

use crate::model::{AppEvent, JobAborted, JobOutput, JobTicket};
use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::Duration;

/// How long shutdown waits for in-flight jobs before detaching them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

type Work = Box<dyn FnOnce() -> JobOutput + Send + 'static>;

/// One unit of blocking work.
pub struct Job {
    ticket: JobTicket,
    label: String,
    work: Work,
}

impl Job {
    pub fn new(
        ticket: JobTicket,
        label: impl Into<String>,
        work: impl FnOnce() -> JobOutput + Send + 'static,
    ) -> Self {
        Self {
            ticket,
            label: label.into(),
            work: Box::new(work),
        }
    }

    pub fn ticket(&self) -> JobTicket {
        self.ticket
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("ticket", &self.ticket)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Commands the UI loop sends to the worker loop.
#[derive(Debug)]
pub enum WorkerCommand {
    Run(Job),
    Shutdown,
}

/// Cloneable submission side of the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: UnboundedSender<WorkerCommand>,
    tickets: Arc<AtomicU64>,
}

impl WorkerHandle {
    pub fn new(tx: UnboundedSender<WorkerCommand>) -> Self {
        Self {
            tx,
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handle plus the receiver to pass to [`run_controller`].
    pub fn channel() -> (Self, UnboundedReceiver<WorkerCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn next_ticket(&self) -> JobTicket {
        JobTicket(self.tickets.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Fails with the job's ticket when the worker loop is no longer running.
    pub fn submit(&self, job: Job) -> Result<(), JobTicket> {
        let ticket = job.ticket;
        self.tx.send(WorkerCommand::Run(job)).map_err(|_| ticket)
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(WorkerCommand::Shutdown);
    }
}

/// Run jobs as they arrive and report each completion on `event_tx`.
///
/// Returns once shutdown is requested (or every handle is dropped) and in-flight
/// jobs have drained, or after [`SHUTDOWN_GRACE`]. Blocking jobs cannot be
/// interrupted, so any still running then are detached and their results dropped.
pub async fn run_controller(
    mut cmd_rx: UnboundedReceiver<WorkerCommand>,
    event_tx: UnboundedSender<AppEvent>,
) -> Result<()> {
    let mut running: JoinSet<(JobTicket, Result<JobOutput, JobAborted>)> = JoinSet::new();
    let mut shutdown_deadline: Option<tokio::time::Instant> = None;
    let mut watchdog = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if shutdown_deadline.is_none() => {
                match cmd {
                    Some(WorkerCommand::Run(job)) => {
                        tracing::debug!(ticket = job.ticket.0, label = %job.label, "job started");
                        let Job { ticket, work, .. } = job;
                        running.spawn_blocking(move || (ticket, run_guarded(work)));
                    }
                    Some(WorkerCommand::Shutdown) | None => {
                        if running.is_empty() {
                            break;
                        }
                        tracing::debug!(in_flight = running.len(), "shutdown requested; draining");
                        shutdown_deadline = Some(tokio::time::Instant::now() + SHUTDOWN_GRACE);
                    }
                }
            }
            // Park this branch while nothing is running so select! doesn't spin on None.
            joined = async {
                if running.is_empty() {
                    futures::future::pending().await
                } else {
                    running.join_next().await
                }
            } => {
                match joined {
                    Some(Ok((ticket, result))) => {
                        tracing::debug!(ticket = ticket.0, ok = result.is_ok(), "job finished");
                        let _ = event_tx.send(AppEvent::JobFinished { ticket, result });
                    }
                    Some(Err(e)) => {
                        // Panics are caught inside the job, so this is cancellation only.
                        tracing::warn!("job join failed: {e}");
                    }
                    None => {}
                }
                if shutdown_deadline.is_some() && running.is_empty() {
                    break;
                }
            }
            _ = watchdog.tick() => {
                if let Some(deadline) = shutdown_deadline {
                    if tokio::time::Instant::now() >= deadline {
                        tracing::warn!(
                            in_flight = running.len(),
                            "detaching jobs still running at shutdown; their results are dropped"
                        );
                        running.detach_all();
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn run_guarded(work: Work) -> Result<JobOutput, JobAborted> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "job panicked".to_string());
        JobAborted { message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionOutcome;

    async fn next_event(rx: &mut UnboundedReceiver<AppEvent>) -> AppEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for worker")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn reports_completion_with_ticket() {
        let (workers, cmd_rx) = WorkerHandle::channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(cmd_rx, event_tx));

        let ticket = workers.next_ticket();
        workers
            .submit(Job::new(ticket, "noop", || {
                JobOutput::Action(ActionOutcome::Succeeded)
            }))
            .unwrap();

        assert_eq!(
            next_event(&mut event_rx).await,
            AppEvent::JobFinished {
                ticket,
                result: Ok(JobOutput::Action(ActionOutcome::Succeeded)),
            }
        );

        workers.shutdown();
        controller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn panicking_job_is_reported_as_aborted() {
        let (workers, cmd_rx) = WorkerHandle::channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_controller(cmd_rx, event_tx));

        let ticket = workers.next_ticket();
        workers
            .submit(Job::new(ticket, "boom", || panic!("executor exploded")))
            .unwrap();

        match next_event(&mut event_rx).await {
            AppEvent::JobFinished {
                ticket: got,
                result: Err(aborted),
            } => {
                assert_eq!(got, ticket);
                assert_eq!(aborted.message, "executor exploded");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_detaches_stuck_job_after_grace() {
        let (workers, cmd_rx) = WorkerHandle::channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(cmd_rx, event_tx));

        let (release, blocked) = std::sync::mpsc::channel::<()>();
        let ticket = workers.next_ticket();
        workers
            .submit(Job::new(ticket, "stuck", move || {
                let _ = blocked.recv();
                JobOutput::Update(Ok(()))
            }))
            .unwrap();
        workers.shutdown();

        tokio::time::timeout(SHUTDOWN_GRACE * 3, controller)
            .await
            .expect("controller outlived the grace period")
            .unwrap()
            .unwrap();
        release.send(()).unwrap();
        assert_eq!(event_rx.recv().await, None);
    }

    #[tokio::test]
    async fn tickets_are_unique_across_clones() {
        let (workers, _rx) = WorkerHandle::channel();
        let other = workers.clone();
        let a = workers.next_ticket();
        let b = other.next_ticket();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn submit_fails_once_controller_is_gone() {
        let (workers, cmd_rx) = WorkerHandle::channel();
        drop(cmd_rx);
        let ticket = workers.next_ticket();
        let rejected = workers
            .submit(Job::new(ticket, "late", || JobOutput::Update(Ok(()))))
            .unwrap_err();
        assert_eq!(rejected, ticket);
    }
}

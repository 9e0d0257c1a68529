use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::StatusSource;
use crate::endpoints::{JobFamily, TaskHandle};
use crate::{ApiError, TaskSnapshot, TaskState};

/// Poll cadence for one monitor activation.
///
/// The period is a minimum inter-read gap: the next read is scheduled only
/// after the previous one resolves, so reads never overlap regardless of
/// backend latency. Every read also carries its own timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub period: Duration,
    pub read_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(3),
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl PollSettings {
    /// Default cadence for a job family (3 s, except 10 s for summarization).
    pub fn for_family(family: JobFamily) -> Self {
        Self {
            period: family.default_period(),
            ..Self::default()
        }
    }
}

/// Receives every successfully parsed snapshot, terminal ones included.
pub trait StatusSink: Send + Sync {
    fn observed(&self, snapshot: &TaskSnapshot);
}

/// How one monitor activation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The handle had no task id; nothing was read and no timer ran.
    Inert,
    Completed(TaskSnapshot),
    Failed(TaskSnapshot),
    Cancelled,
    /// Transport, decode, or timeout failure on a read. The loop stops on
    /// the first one; the caller's error path decides what to surface.
    Errored(ApiError),
}

impl PollOutcome {
    pub fn is_terminal_status(&self) -> bool {
        matches!(self, PollOutcome::Completed(_) | PollOutcome::Failed(_))
    }
}

/// Poll `handle` against `source` until the job reaches a terminal state,
/// the first read fails, or `cancel` fires.
///
/// Activation with an absent task id returns [`PollOutcome::Inert`] without
/// touching the network. Otherwise the first read happens one full period
/// after activation, matching the backend's enqueue-then-pending lifecycle.
/// A snapshot from a read in flight at cancellation time is not delivered.
pub async fn poll_until_terminal(
    source: &dyn StatusSource,
    handle: &TaskHandle,
    settings: &PollSettings,
    cancel: &CancellationToken,
    sink: &dyn StatusSink,
) -> PollOutcome {
    let Some(task_id) = handle.task_id.as_ref() else {
        return PollOutcome::Inert;
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(settings.period) => {}
        }

        let read = tokio::time::timeout(
            settings.read_timeout,
            source.task_status(&handle.endpoint, task_id),
        );
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            result = read => match result {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(err)) => return PollOutcome::Errored(err),
                Err(_) => return PollOutcome::Errored(ApiError::Timeout),
            }
        };

        sink.observed(&snapshot);
        match snapshot.status {
            TaskState::Completed => return PollOutcome::Completed(snapshot),
            TaskState::Failed => return PollOutcome::Failed(snapshot),
            _ => {}
        }
    }
}

/// Reusable polling primitive: one instance per status source, one
/// [`MonitorGuard`] per activation.
pub struct TaskMonitor {
    source: Arc<dyn StatusSource>,
    settings: PollSettings,
}

impl TaskMonitor {
    pub fn new(source: Arc<dyn StatusSource>, settings: PollSettings) -> Self {
        Self { source, settings }
    }

    /// Start polling `handle` on the current runtime.
    ///
    /// The caller must hold the guard for as long as the activation should
    /// stay alive: dropping it cancels, so a stale loop can never outlive
    /// the view that owns the handle.
    pub fn spawn(&self, handle: TaskHandle, sink: Arc<dyn StatusSink>) -> MonitorGuard {
        let token = CancellationToken::new();
        let child = token.clone();
        let source = self.source.clone();
        let settings = self.settings.clone();
        let task = tokio::spawn(async move {
            poll_until_terminal(source.as_ref(), &handle, &settings, &child, sink.as_ref()).await
        });
        MonitorGuard {
            token,
            task: Some(task),
        }
    }
}

/// Cancellation handle for one monitor activation.
pub struct MonitorGuard {
    token: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl MonitorGuard {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the activation to end and return how it did.
    pub async fn settled(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

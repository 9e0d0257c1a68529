use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use console_engine::{
    poll_until_terminal, ApiError, JobFamily, PollOutcome, PollSettings, StatusEndpoint,
    StatusSink, StatusSource, TaskHandle, TaskId, TaskMonitor, TaskSnapshot, TaskState,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn snap(status: &str) -> TaskSnapshot {
    TaskSnapshot {
        task_id: None,
        status: TaskState::from(status.to_string()),
        result: None,
    }
}

fn snap_with_result(status: &str, result: serde_json::Value) -> TaskSnapshot {
    TaskSnapshot {
        result: Some(result),
        ..snap(status)
    }
}

/// Serves a scripted sequence of snapshots, counting every read. Reads past
/// the end of the script fail, which a correct monitor never triggers.
struct ScriptedSource {
    reads: Mutex<VecDeque<TaskSnapshot>>,
    read_count: AtomicUsize,
    read_delay: Duration,
}

impl ScriptedSource {
    fn new(script: Vec<TaskSnapshot>) -> Self {
        Self {
            reads: Mutex::new(script.into()),
            read_count: AtomicUsize::new(0),
            read_delay: Duration::ZERO,
        }
    }

    fn with_delay(script: Vec<TaskSnapshot>, read_delay: Duration) -> Self {
        Self {
            read_delay,
            ..Self::new(script)
        }
    }

    fn reads_issued(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatusSource for ScriptedSource {
    async fn task_status(
        &self,
        _endpoint: &StatusEndpoint,
        _task_id: &TaskId,
    ) -> Result<TaskSnapshot, ApiError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        match self.reads.lock().unwrap().pop_front() {
            Some(snapshot) => Ok(snapshot),
            None => Err(ApiError::Network("script exhausted".to_string())),
        }
    }
}

#[derive(Default)]
struct CollectSink {
    seen: Mutex<Vec<TaskSnapshot>>,
}

impl CollectSink {
    fn statuses(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|snapshot| snapshot.status.as_str().to_string())
            .collect()
    }
}

impl StatusSink for CollectSink {
    fn observed(&self, snapshot: &TaskSnapshot) {
        self.seen.lock().unwrap().push(snapshot.clone());
    }
}

fn fast_settings() -> PollSettings {
    PollSettings {
        period: Duration::from_millis(20),
        read_timeout: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn absent_task_id_issues_no_reads_and_no_timers() {
    let source = ScriptedSource::new(vec![snap("pending")]);
    let sink = CollectSink::default();
    let handle = TaskHandle::vacant(JobFamily::Extraction);
    let cancel = CancellationToken::new();

    // Inert activation returns immediately; no period elapses.
    let outcome = tokio::time::timeout(
        Duration::from_millis(10),
        poll_until_terminal(&source, &handle, &fast_settings(), &cancel, &sink),
    )
    .await
    .expect("inert monitor must not wait for a tick");

    assert_eq!(outcome, PollOutcome::Inert);
    assert_eq!(source.reads_issued(), 0);
    assert!(sink.statuses().is_empty());
}

#[tokio::test]
async fn every_snapshot_is_observed_until_completed() {
    let source = ScriptedSource::new(vec![
        snap("pending"),
        snap("pending"),
        snap_with_result("completed", json!({"count": 3})),
    ]);
    let sink = CollectSink::default();
    let handle = TaskHandle::new(TaskId::from("42"), JobFamily::Extraction);
    let cancel = CancellationToken::new();

    let outcome = poll_until_terminal(&source, &handle, &fast_settings(), &cancel, &sink).await;

    assert_eq!(sink.statuses(), vec!["pending", "pending", "completed"]);
    assert_eq!(source.reads_issued(), 3);
    match outcome {
        PollOutcome::Completed(snapshot) => {
            assert_eq!(snapshot.result, Some(json!({"count": 3})));
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_status_stops_after_its_single_observation() {
    let source = Arc::new(ScriptedSource::new(vec![snap_with_result(
        "failed",
        json!("boom"),
    )]));
    let sink = Arc::new(CollectSink::default());
    let monitor = TaskMonitor::new(source.clone(), fast_settings());
    let handle = TaskHandle::new(TaskId::from("9"), JobFamily::StageProcessing);

    let guard = monitor.spawn(handle, sink.clone());
    let outcome = guard.settled().await;

    assert!(matches!(outcome, PollOutcome::Failed(_)));
    assert_eq!(sink.statuses(), vec!["failed"]);

    // Even after further periods elapse, no new read happens.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(source.reads_issued(), 1);
}

#[tokio::test]
async fn cancellation_suppresses_an_in_flight_read() {
    // Each read takes 150 ms; cancel lands while the first is in flight.
    let source = Arc::new(ScriptedSource::with_delay(
        vec![snap("pending"), snap("pending")],
        Duration::from_millis(150),
    ));
    let sink = Arc::new(CollectSink::default());
    let monitor = TaskMonitor::new(source.clone(), fast_settings());
    let handle = TaskHandle::new(TaskId::from("7"), JobFamily::Extraction);

    let guard = monitor.spawn(handle, sink.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.reads_issued(), 1);

    guard.cancel();
    let outcome = guard.settled().await;

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert!(sink.statuses().is_empty());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(source.reads_issued(), 1);
}

#[tokio::test]
async fn dropping_the_guard_cancels_the_loop() {
    let source = Arc::new(ScriptedSource::new(vec![snap("pending"); 50]));
    let sink = Arc::new(CollectSink::default());
    let monitor = TaskMonitor::new(source.clone(), fast_settings());
    let handle = TaskHandle::new(TaskId::from("11"), JobFamily::Extraction);

    let guard = monitor.spawn(handle, sink);
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(guard);

    tokio::time::sleep(Duration::from_millis(30)).await;
    let after_drop = source.reads_issued();
    assert!(after_drop >= 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.reads_issued(), after_drop);
}

#[tokio::test]
async fn read_timeout_is_a_poll_error() {
    let source = ScriptedSource::with_delay(vec![snap("pending")], Duration::from_millis(200));
    let sink = CollectSink::default();
    let handle = TaskHandle::new(TaskId::from("5"), JobFamily::Extraction);
    let cancel = CancellationToken::new();
    let settings = PollSettings {
        period: Duration::from_millis(20),
        read_timeout: Duration::from_millis(50),
    };

    let outcome = poll_until_terminal(&source, &handle, &settings, &cancel, &sink).await;

    assert_eq!(outcome, PollOutcome::Errored(ApiError::Timeout));
    assert!(sink.statuses().is_empty());
    assert_eq!(source.reads_issued(), 1);
}

#[tokio::test]
async fn transport_failure_stops_the_loop_without_retry() {
    let source = ScriptedSource::new(Vec::new());
    let sink = CollectSink::default();
    let handle = TaskHandle::new(TaskId::from("5"), JobFamily::Summarization);
    let cancel = CancellationToken::new();

    let outcome = poll_until_terminal(&source, &handle, &fast_settings(), &cancel, &sink).await;

    assert!(matches!(outcome, PollOutcome::Errored(ApiError::Network(_))));
    assert_eq!(source.reads_issued(), 1);
    assert!(sink.statuses().is_empty());
}

#[tokio::test]
async fn running_running_completed_carries_the_final_result() {
    let source = Arc::new(ScriptedSource::new(vec![
        snap("running"),
        snap("running"),
        snap_with_result("completed", json!({"count": 17})),
    ]));
    let sink = Arc::new(CollectSink::default());
    let monitor = TaskMonitor::new(source.clone(), fast_settings());
    let handle = TaskHandle::new(
        TaskId::from("42"),
        console_engine::StatusEndpoint::new("/api/jira/status"),
    );

    let guard = monitor.spawn(handle, sink.clone());
    let outcome = guard.settled().await;

    assert_eq!(sink.statuses(), vec!["running", "running", "completed"]);
    let last = sink.seen.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last.result.as_ref().and_then(|r| r.get("count")), Some(&json!(17)));
    assert!(matches!(outcome, PollOutcome::Completed(_)));

    // One more nominal period passes; no fourth read is attempted.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(source.reads_issued(), 3);
}

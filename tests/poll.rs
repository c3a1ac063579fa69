// ABOUTME: Tests for the operation poller with scripted operations.
// ABOUTME: Completion, remote failure, timeout, query retries, and cancellation.

mod support;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hoist::cloud::{CloudError, Operation, OperationStatus};
use hoist::error::ErrorKind;
use hoist::poll::{OperationPoller, PollError, PollSettings};
use parking_lot::Mutex;
use support::init_tracing;
use tokio_util::sync::CancellationToken;

/// Replays scripted answers; keeps returning the last one once exhausted.
struct Scripted {
    answers: Mutex<VecDeque<Result<OperationStatus<u32>, CloudError>>>,
    queries: Mutex<u32>,
}

impl Scripted {
    fn new(answers: Vec<Result<OperationStatus<u32>, CloudError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            queries: Mutex::new(0),
        }
    }

    fn queries(&self) -> u32 {
        *self.queries.lock()
    }
}

#[async_trait]
impl Operation for Scripted {
    type Output = u32;

    fn name(&self) -> &str {
        "scripted"
    }

    async fn status(&self) -> Result<OperationStatus<u32>, CloudError> {
        *self.queries.lock() += 1;
        let mut answers = self.answers.lock();
        if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().cloned().unwrap()
        }
    }
}

fn settings(timeout_ms: u64) -> PollSettings {
    PollSettings::new(Duration::from_millis(timeout_ms), Duration::from_millis(5))
        .max_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn returns_output_after_pending() {
    init_tracing();
    let op = Scripted::new(vec![
        Ok(OperationStatus::Pending),
        Ok(OperationStatus::Pending),
        Ok(OperationStatus::Done(7)),
    ]);

    let output = OperationPoller::default()
        .wait(&op, settings(1000))
        .await
        .unwrap();

    assert_eq!(output, 7);
    assert_eq!(op.queries(), 3);
}

#[tokio::test]
async fn remote_failure_carries_message() {
    init_tracing();
    let op = Scripted::new(vec![
        Ok(OperationStatus::Pending),
        Ok(OperationStatus::Failed("quota exceeded".to_string())),
    ]);

    let err = OperationPoller::default()
        .wait(&op, settings(1000))
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Remote { ref message, .. } if message == "quota exceeded"));
    assert_eq!(err.kind(), ErrorKind::PermanentRemote);
}

#[tokio::test]
async fn never_finishing_operation_times_out() {
    init_tracing();
    let op = Scripted::new(vec![Ok(OperationStatus::Pending)]);

    let started = Instant::now();
    let err = OperationPoller::default()
        .wait(&op, settings(50))
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Timeout { .. }));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn transient_query_errors_are_retried() {
    init_tracing();
    let op = Scripted::new(vec![
        Err(CloudError::Transient("connection reset".to_string())),
        Err(CloudError::Transient("502".to_string())),
        Ok(OperationStatus::Done(1)),
    ]);

    let output = OperationPoller::default()
        .wait(&op, settings(1000))
        .await
        .unwrap();

    assert_eq!(output, 1);
    assert_eq!(op.queries(), 3);
}

#[tokio::test]
async fn permanent_query_error_stops_waiting() {
    init_tracing();
    let op = Scripted::new(vec![Err(CloudError::Permanent("forbidden".to_string()))]);

    let err = OperationPoller::default()
        .wait(&op, settings(1000))
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Query { .. }));
    assert_eq!(err.kind(), ErrorKind::PermanentRemote);
    assert_eq!(op.queries(), 1);
}

#[tokio::test]
async fn cancelled_token_stops_before_first_query() {
    init_tracing();
    let op = Scripted::new(vec![Ok(OperationStatus::Done(1))]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = OperationPoller::new(cancel)
        .wait(&op, settings(1000))
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Cancelled { .. }));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(op.queries(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_a_long_sleep() {
    init_tracing();
    let op = Scripted::new(vec![Ok(OperationStatus::Pending)]);
    let cancel = CancellationToken::new();
    let poller = OperationPoller::new(cancel.clone());
    let slow = PollSettings::new(Duration::from_secs(60), Duration::from_secs(30));

    let started = Instant::now();
    let (result, ()) = tokio::join!(poller.wait(&op, slow), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(PollError::Cancelled { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(op.queries(), 1);
}

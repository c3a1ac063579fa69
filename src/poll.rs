// ABOUTME: Generic wait loop for long-running remote operations.
// ABOUTME: Polls with bounded backoff until done, failed, timed out, or cancelled.

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cloud::{CloudError, Operation, OperationStatus};
use crate::error::ErrorKind;

/// Timing parameters for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Total time allowed for the operation to finish.
    pub timeout: Duration,
    /// Delay before the second status query.
    pub interval: Duration,
    /// Upper bound the delay grows to.
    pub max_interval: Duration,
}

impl PollSettings {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            max_interval: interval.max(Duration::from_secs(30)),
        }
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval.max(self.interval);
        self
    }

    fn next_interval(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_interval)
    }
}

/// Errors from waiting on an operation.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("operation {operation} did not finish within {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("operation {operation} failed: {message}")]
    Remote { operation: String, message: String },

    #[error("failed to query operation {operation}: {source}")]
    Query {
        operation: String,
        source: CloudError,
    },

    #[error("wait for operation {operation} was cancelled")]
    Cancelled { operation: String },
}

impl PollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PollError::Timeout { .. } => ErrorKind::Timeout,
            PollError::Remote { .. } => ErrorKind::PermanentRemote,
            PollError::Query { source, .. } => source.kind(),
            PollError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }
}

/// Waits on operations for a single pipeline invocation.
///
/// The cancellation token is checked before every status query and raced
/// against every sleep, so an abort never waits out a full interval.
#[derive(Debug, Clone, Default)]
pub struct OperationPoller {
    cancel: CancellationToken,
}

impl OperationPoller {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait for `operation` to finish and return its result.
    ///
    /// Transient failures of the status query are retried until the deadline;
    /// any other query failure aborts the wait.
    ///
    /// # Errors
    ///
    /// - `PollError::Timeout` when the deadline passes first.
    /// - `PollError::Remote` when the operation reports failure.
    /// - `PollError::Query` when the status query fails permanently.
    /// - `PollError::Cancelled` when the token fires.
    pub async fn wait<O>(&self, operation: &O, settings: PollSettings) -> Result<O::Output, PollError>
    where
        O: Operation + ?Sized,
    {
        let name = operation.name().to_string();
        let deadline = Instant::now() + settings.timeout;
        let mut interval = settings.interval;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let query = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(PollError::Cancelled { operation: name });
                }
                query = timeout_at(deadline, operation.status()) => query,
            };

            let Ok(status) = query else {
                return Err(PollError::Timeout {
                    operation: name,
                    after: settings.timeout,
                });
            };

            match status {
                Ok(OperationStatus::Done(output)) => {
                    debug!(operation = %name, attempt, "operation finished");
                    return Ok(output);
                }
                Ok(OperationStatus::Failed(message)) => {
                    return Err(PollError::Remote {
                        operation: name,
                        message,
                    });
                }
                Ok(OperationStatus::Pending) => {
                    debug!(operation = %name, attempt, "operation still pending");
                }
                Err(e) if e.is_transient() => {
                    warn!(operation = %name, attempt, error = %e, "status query failed, retrying");
                }
                Err(source) => {
                    return Err(PollError::Query {
                        operation: name,
                        source,
                    });
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PollError::Timeout {
                    operation: name,
                    after: settings.timeout,
                });
            }

            let nap = interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(PollError::Cancelled { operation: name });
                }
                _ = sleep(nap) => {}
            }
            interval = settings.next_interval(interval);
        }
    }
}

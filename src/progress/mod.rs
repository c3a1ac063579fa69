// ABOUTME: Outbound progress notifications for pipeline invocations.
// ABOUTME: ProgressEvent, the ProgressSink observer, and the per-invocation Reporter.

mod console;

pub use console::{ConsoleSink, OutputMode};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::deploy::Stage;

/// Importance of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// A notification emitted while a pipeline runs. Never read back by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    /// Identifies the invocation that produced the event.
    pub correlation_id: Uuid,
    /// Stage that was running, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Receives progress events. Implementations must not block for long.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn on_event(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Stamps events for one invocation and forwards them to a sink.
///
/// Every event is also logged through `tracing` with the correlation id, so
/// logs of concurrent invocations stay attributable. A panicking sink is
/// logged and otherwise ignored.
pub struct Reporter {
    correlation_id: Uuid,
    sink: Arc<dyn ProgressSink>,
    stage: Mutex<Option<Stage>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("correlation_id", &self.correlation_id)
            .field("stage", &*self.stage.lock())
            .finish()
    }
}

impl Reporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self::with_correlation_id(sink, Uuid::new_v4())
    }

    pub fn with_correlation_id(sink: Arc<dyn ProgressSink>, correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            sink,
            stage: Mutex::new(None),
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Attribute subsequent events to `stage`.
    pub(crate) fn set_stage(&self, stage: Option<Stage>) {
        *self.stage.lock() = stage;
    }

    pub fn emit(&self, severity: Severity, message: impl Into<String>) {
        let event = ProgressEvent {
            correlation_id: self.correlation_id,
            stage: *self.stage.lock(),
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        };

        let id = event.correlation_id;
        let stage = event.stage.map(|s| s.as_str()).unwrap_or("-");
        match severity {
            Severity::Debug => tracing::debug!(correlation_id = %id, stage, "{}", event.message),
            Severity::Info => tracing::info!(correlation_id = %id, stage, "{}", event.message),
            Severity::Warn => tracing::warn!(correlation_id = %id, stage, "{}", event.message),
            Severity::Error => tracing::error!(correlation_id = %id, stage, "{}", event.message),
        }

        if catch_unwind(AssertUnwindSafe(|| self.sink.on_event(&event))).is_err() {
            tracing::warn!(correlation_id = %id, "progress sink panicked; event dropped");
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Severity::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message);
    }
}

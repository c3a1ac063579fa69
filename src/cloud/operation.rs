// ABOUTME: Handle type for long-running remote operations.
// ABOUTME: An operation only exposes a status query; waiting is the poller's job.

use async_trait::async_trait;

use super::CloudError;

/// Snapshot of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus<T> {
    /// Still running.
    Pending,
    /// Finished successfully with a result.
    Done(T),
    /// Finished with a failure reported by the remote service.
    Failed(String),
}

/// A pollable handle to an asynchronous remote action.
#[async_trait]
pub trait Operation: Send + Sync {
    type Output: Send;

    /// Identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Query the current status. Must not mutate caller-visible state.
    async fn status(&self) -> Result<OperationStatus<Self::Output>, CloudError>;
}

/// Operation handle as returned by capability traits.
pub type BoxedOperation<T> = Box<dyn Operation<Output = T>>;

/// An operation that already finished, for calls the remote side completed synchronously.
#[derive(Debug, Clone)]
pub struct CompletedOperation<T> {
    name: String,
    value: T,
}

impl<T> CompletedOperation<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> CompletedOperation<T> {
    pub fn boxed(name: impl Into<String>, value: T) -> BoxedOperation<T> {
        Box::new(Self::new(name, value))
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Operation for CompletedOperation<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn status(&self) -> Result<OperationStatus<T>, CloudError> {
        Ok(OperationStatus::Done(self.value.clone()))
    }
}

// ABOUTME: Operation handles backed by gcloud describe commands.
// ABOUTME: Covers long-running service operations and Cloud Build builds.

use async_trait::async_trait;
use serde::Deserialize;

use super::command::CliCommand;
use crate::cloud::{BuildOutcome, CloudError, Operation, OperationStatus};

/// A google.longrunning operation, polled via a `describe` command.
///
/// The result is known when the operation is started, so it is carried here
/// and handed out once the operation reports `done`.
pub(super) struct LongRunning<T> {
    name: String,
    describe: CliCommand,
    output: T,
}

impl<T> LongRunning<T> {
    pub(super) fn new(name: String, describe: CliCommand, output: T) -> Self {
        Self {
            name,
            describe,
            output,
        }
    }
}

/// The subset of an operation document we read.
#[derive(Debug, Deserialize)]
pub(super) struct OperationDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<StatusDoc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusDoc {
    #[serde(default)]
    pub message: String,
}

#[async_trait]
impl<T: Clone + Send + Sync> Operation for LongRunning<T> {
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn status(&self) -> Result<OperationStatus<T>, CloudError> {
        let doc: OperationDoc = self.describe.json().await?;
        Ok(match (doc.done, doc.error) {
            (_, Some(error)) => OperationStatus::Failed(error.message),
            (true, None) => OperationStatus::Done(self.output.clone()),
            (false, None) => OperationStatus::Pending,
        })
    }
}

/// A Cloud Build build, polled via `gcloud builds describe`.
pub(super) struct BuildHandle {
    id: String,
    describe: CliCommand,
}

impl BuildHandle {
    pub(super) fn new(id: String, describe: CliCommand) -> Self {
        Self { id, describe }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BuildDoc {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub results: Option<BuildResults>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuildResults {
    #[serde(default)]
    pub images: Vec<BuiltImage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuiltImage {
    pub digest: Option<String>,
}

impl BuildDoc {
    pub(super) fn into_status(self) -> OperationStatus<BuildOutcome> {
        match self.status.as_str() {
            "SUCCESS" => OperationStatus::Done(BuildOutcome {
                image_digest: self
                    .results
                    .and_then(|r| r.images.into_iter().find_map(|i| i.digest)),
                build_id: self.id,
            }),
            "FAILURE" | "INTERNAL_ERROR" | "TIMEOUT" | "CANCELLED" | "EXPIRED" => {
                OperationStatus::Failed(match self.status_detail {
                    Some(detail) => format!("build {} {}: {detail}", self.id, self.status),
                    None => format!("build {} {}", self.id, self.status),
                })
            }
            _ => OperationStatus::Pending,
        }
    }
}

#[async_trait]
impl Operation for BuildHandle {
    type Output = BuildOutcome;

    fn name(&self) -> &str {
        &self.id
    }

    async fn status(&self) -> Result<OperationStatus<BuildOutcome>, CloudError> {
        let doc: BuildDoc = self.describe.json().await?;
        Ok(doc.into_status())
    }
}

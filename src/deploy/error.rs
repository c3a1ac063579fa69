// ABOUTME: Pipeline error types with SNAFU context selectors.
// ABOUTME: Every failure names the stage it happened in and keeps the component error.

use snafu::Snafu;

use super::request::ValidationError;
use super::stage::Stage;
use crate::apply::ApplyError;
use crate::build::BuildError;
use crate::cloud::CloudError;
use crate::error::ErrorKind;
use crate::package::PackageError;
use crate::poll::PollError;
use crate::types::ParseImageRefError;
use crate::provision::ProvisionError;

/// Failure of a single stage, as reported by the component it ran.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("failed to upload {key} to bucket {bucket}: {source}")]
    Upload {
        bucket: String,
        key: String,
        source: CloudError,
    },

    #[error("repository {repository} does not form a valid image target: {source}")]
    ImageTarget {
        repository: String,
        source: ParseImageRefError,
    },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("build did not succeed: {0}")]
    BuildWait(#[source] PollError),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::Provision(e) => e.kind(),
            StageError::Package(e) => e.kind(),
            StageError::Upload { source, .. } => source.kind(),
            StageError::ImageTarget { .. } => ErrorKind::PermanentRemote,
            StageError::Build(e) => e.kind(),
            StageError::BuildWait(e) => e.kind(),
            StageError::Apply(e) => e.kind(),
        }
    }
}

/// Terminal error of a pipeline run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeployError {
    #[snafu(display("invalid deployment request: {source}"))]
    Validation { source: ValidationError },

    #[snafu(display("stage {stage} failed: {source}"))]
    Stage { stage: Stage, source: StageError },

    #[snafu(display("deployment cancelled during stage {stage}"))]
    Cancelled { stage: Stage },
}

impl DeployError {
    /// Error class for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::Validation { .. } => ErrorKind::Validation,
            DeployError::Stage { source, .. } => source.kind(),
            DeployError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Stage that failed, if the run got past validation.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Validation { .. } => None,
            DeployError::Stage { stage, .. } | DeployError::Cancelled { stage } => Some(*stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_stage_and_keeps_kind() {
        let err = DeployError::Stage {
            stage: Stage::EnsureCluster,
            source: StageError::Provision(ProvisionError::ClusterMissing {
                cluster: "main (us-central1)".to_string(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.stage(), Some(Stage::EnsureCluster));
        let message = err.to_string();
        assert!(message.contains("ensure-cluster"));
        assert!(message.contains("main (us-central1)"));
    }

    #[test]
    fn cancelled_kind() {
        let err = DeployError::Cancelled {
            stage: Stage::TriggerBuild,
        };
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.stage(), Some(Stage::TriggerBuild));
    }
}

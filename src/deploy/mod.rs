// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports the request, stage tracking, errors, rollout states, and the orchestrator.

mod error;
mod orchestrator;
mod request;
mod rollout;
mod stage;
mod state;
mod transitions;

pub use error::{DeployError, StageError};
pub use orchestrator::{
    BUILD_QUEUE_ALLOWANCE, DEFAULT_APIS, DEFAULT_REPOSITORY, DeploymentReport, Orchestrator, Settings, Timeouts,
};
pub use request::{DeploymentRequest, DeploymentResult, ValidationError};
pub use rollout::Rollout;
pub use stage::{ClusterCheck, Stage, StageResult, StageState, StageTracker};
pub use state::{
    ApisEnabled, BucketReady, Deployed, ImageBuilt, Prepared, RegistryReady, SourcePackaged,
    SourceUploaded,
};

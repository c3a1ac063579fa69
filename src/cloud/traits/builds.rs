// ABOUTME: Remote build service operations.
// ABOUTME: Submit a build job and receive an operation handle.

use async_trait::async_trait;

use super::shared_types::{BuildOutcome, BuildRequest};
use crate::cloud::{BoxedOperation, CloudError};
use crate::types::ProjectId;

/// Remote container builds.
#[async_trait]
pub trait BuildOps: Send + Sync {
    /// Submit a build. The build runs remotely; the operation reports its outcome.
    async fn submit_build(
        &self,
        project: &ProjectId,
        request: &BuildRequest,
    ) -> Result<BoxedOperation<BuildOutcome>, CloudError>;
}

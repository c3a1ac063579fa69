// ABOUTME: Service API flag operations.
// ABOUTME: Read whether an API is enabled on a project and enable it.

use async_trait::async_trait;

use super::shared_types::ApiState;
use crate::cloud::{BoxedOperation, CloudError};
use crate::types::ProjectId;

/// API enablement: read state, enable.
#[async_trait]
pub trait ApiOps: Send + Sync {
    /// Whether the named API (e.g. `cloudbuild.googleapis.com`) is enabled.
    async fn api_state(&self, project: &ProjectId, api: &str) -> Result<ApiState, CloudError>;

    /// Start enabling an API. Completion is observed through the returned operation.
    async fn enable_api(
        &self,
        project: &ProjectId,
        api: &str,
    ) -> Result<BoxedOperation<()>, CloudError>;
}

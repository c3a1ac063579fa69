// ABOUTME: Container registry repository operations.
// ABOUTME: Read and create repositories that receive built images.

use async_trait::async_trait;

use super::shared_types::{RepositoryFormat, RepositoryInfo};
use crate::cloud::{BoxedOperation, CloudError};
use crate::types::ProjectId;

/// Registry repositories: lookup and creation.
#[async_trait]
pub trait RegistryOps: Send + Sync {
    /// Look up a repository. `Ok(None)` means it does not exist.
    async fn get_repository(
        &self,
        project: &ProjectId,
        location: &str,
        name: &str,
    ) -> Result<Option<RepositoryInfo>, CloudError>;

    /// Start creating a repository.
    async fn create_repository(
        &self,
        project: &ProjectId,
        location: &str,
        name: &str,
        format: RepositoryFormat,
    ) -> Result<BoxedOperation<RepositoryInfo>, CloudError>;
}

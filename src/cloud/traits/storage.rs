// ABOUTME: Object storage operations.
// ABOUTME: Read and create buckets, upload objects.

use async_trait::async_trait;
use bytes::Bytes;

use super::shared_types::{BucketInfo, SourceLocation};
use crate::cloud::CloudError;
use crate::types::ProjectId;

/// Object storage: bucket lookup and creation, uploads.
#[async_trait]
pub trait StorageOps: Send + Sync {
    /// Look up a bucket. `Ok(None)` means it does not exist.
    async fn get_bucket(
        &self,
        project: &ProjectId,
        name: &str,
    ) -> Result<Option<BucketInfo>, CloudError>;

    /// Create a bucket in the given location.
    async fn create_bucket(
        &self,
        project: &ProjectId,
        name: &str,
        location: &str,
    ) -> Result<BucketInfo, CloudError>;

    /// Upload bytes to `bucket/key`, replacing any existing object.
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<SourceLocation, CloudError>;
}

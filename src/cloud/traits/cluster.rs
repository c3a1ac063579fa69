// ABOUTME: Cluster control plane operations.
// ABOUTME: Existence check, credentials, descriptor apply, and external address lookup.

use async_trait::async_trait;

use super::shared_types::{ClusterAccess, ClusterId};
use crate::cloud::CloudError;
use crate::manifest::Descriptor;

/// Access to a pre-existing managed cluster.
#[async_trait]
pub trait ClusterOps: Send + Sync {
    /// Whether the cluster exists. A missing cluster is `Ok(false)`, not an error.
    async fn cluster_exists(&self, cluster: &ClusterId) -> Result<bool, CloudError>;

    /// Obtain credentials for the cluster's control plane.
    async fn fetch_credentials(&self, cluster: &ClusterId) -> Result<ClusterAccess, CloudError>;

    /// Apply a descriptor. Re-applying an unchanged descriptor is a no-op.
    async fn apply_descriptor(
        &self,
        access: &ClusterAccess,
        descriptor: &Descriptor,
    ) -> Result<(), CloudError>;

    /// External address assigned to a network-exposure object, if any yet.
    async fn external_address(
        &self,
        access: &ClusterAccess,
        service: &str,
    ) -> Result<Option<String>, CloudError>;
}

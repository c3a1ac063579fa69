// ABOUTME: Composable capability traits for cloud services.
// ABOUTME: Defines ApiOps, StorageOps, RegistryOps, BuildOps, ClusterOps, and CloudOps.

mod apis;
mod builds;
mod cluster;
mod registry;
mod shared_types;
mod storage;

pub use apis::ApiOps;
pub use builds::BuildOps;
pub use cluster::ClusterOps;
pub use registry::RegistryOps;
pub use shared_types::*;
pub use storage::StorageOps;

/// Every capability the deployment pipeline needs, implemented by one adapter.
pub trait CloudOps: ApiOps + StorageOps + RegistryOps + BuildOps + ClusterOps {}

impl<T> CloudOps for T where T: ApiOps + StorageOps + RegistryOps + BuildOps + ClusterOps {}

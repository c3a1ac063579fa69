// ABOUTME: Applies workload descriptors to a confirmed cluster.
// ABOUTME: Waits for the load balancer address and returns the service URL.

use std::net::Ipv6Addr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::cloud::{ClusterAccess, ClusterOps, CloudError, Operation, OperationStatus};
use crate::error::ErrorKind;
use crate::manifest::{Descriptor, Manifests};
use crate::poll::{OperationPoller, PollError, PollSettings};
use crate::progress::Reporter;
use crate::provision::ClusterConfirmed;

/// Errors from applying descriptors.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("failed to get credentials for cluster {cluster}: {source}")]
    Credentials { cluster: String, source: CloudError },

    #[error("failed to apply {kind} {name}: {source}")]
    Apply {
        kind: &'static str,
        name: String,
        source: CloudError,
    },

    /// Descriptors were applied but no address was assigned in time.
    #[error("service {service} got no external address within {after:?}")]
    AddressTimeout { service: String, after: Duration },

    #[error("waiting for the address of service {service} failed: {source}")]
    AddressWait { service: String, source: PollError },
}

impl ApplyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplyError::Credentials { source, .. } | ApplyError::Apply { source, .. } => {
                source.kind()
            }
            ApplyError::AddressTimeout { .. } => ErrorKind::Timeout,
            ApplyError::AddressWait { source, .. } => source.kind(),
        }
    }
}

/// Applies descriptors and reports where the service is reachable.
pub struct DeploymentApplier<'a, C> {
    cluster: &'a C,
    poller: &'a OperationPoller,
    reporter: &'a Reporter,
    address: PollSettings,
}

impl<'a, C: ClusterOps> DeploymentApplier<'a, C> {
    pub fn new(
        cluster: &'a C,
        poller: &'a OperationPoller,
        reporter: &'a Reporter,
        address: PollSettings,
    ) -> Self {
        Self {
            cluster,
            poller,
            reporter,
            address,
        }
    }

    /// Apply the workload then the exposure descriptor and wait for an address.
    ///
    /// Requires a `ClusterConfirmed`, so the cluster existence check has
    /// necessarily run first.
    ///
    /// # Errors
    ///
    /// `ApplyError::AddressTimeout` when the descriptors applied but no address
    /// appeared in time; other variants when credentials or apply calls fail.
    pub async fn apply(
        &self,
        confirmed: &ClusterConfirmed,
        manifests: &Manifests,
    ) -> Result<String, ApplyError> {
        let cluster = confirmed.cluster();
        let access = self
            .cluster
            .fetch_credentials(cluster)
            .await
            .map_err(|source| ApplyError::Credentials {
                cluster: cluster.to_string(),
                source,
            })?;

        self.apply_one(&access, &manifests.deployment).await?;
        self.apply_one(&access, &manifests.service).await?;

        let service = manifests.service.name().to_string();
        self.reporter
            .info(format!("waiting for external address of {service}"));

        let watch = AddressWatch {
            cluster: self.cluster,
            access: &access,
            name: format!("address of service {service}"),
            service: service.clone(),
        };
        let address = self
            .poller
            .wait(&watch, self.address)
            .await
            .map_err(|source| match source {
                PollError::Timeout { after, .. } => ApplyError::AddressTimeout {
                    service: service.clone(),
                    after,
                },
                source => ApplyError::AddressWait {
                    service: service.clone(),
                    source,
                },
            })?;

        let url = service_url(&address);
        info!(%service, %url, "service reachable");
        Ok(url)
    }

    async fn apply_one(
        &self,
        access: &ClusterAccess,
        descriptor: &Descriptor,
    ) -> Result<(), ApplyError> {
        self.cluster
            .apply_descriptor(access, descriptor)
            .await
            .map_err(|source| ApplyError::Apply {
                kind: descriptor.kind().as_str(),
                name: descriptor.name().to_string(),
                source,
            })?;
        self.reporter.info(format!(
            "applied {} {}",
            descriptor.kind().as_str(),
            descriptor.name()
        ));
        Ok(())
    }
}

/// Pending until the exposure object reports a non-empty address.
struct AddressWatch<'a, C> {
    cluster: &'a C,
    access: &'a ClusterAccess,
    name: String,
    service: String,
}

#[async_trait]
impl<'a, C: ClusterOps> Operation for AddressWatch<'a, C> {
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn status(&self) -> Result<OperationStatus<String>, CloudError> {
        let address = self
            .cluster
            .external_address(self.access, &self.service)
            .await?;
        Ok(match address {
            Some(address) if !address.trim().is_empty() => {
                OperationStatus::Done(address.trim().to_string())
            }
            _ => OperationStatus::Pending,
        })
    }
}

/// `http://` URL for an address, bracketing IPv6 literals.
pub fn service_url(address: &str) -> String {
    if address.parse::<Ipv6Addr>().is_ok() {
        format!("http://[{address}]")
    } else {
        format!("http://{address}")
    }
}

// ABOUTME: Idempotent ensure-exists provisioning of cloud prerequisites.
// ABOUTME: Reads state first, creates only when missing, and never creates clusters.

use tracing::{debug, info};

use crate::cloud::{
    ApiOps, ApiState, ClusterId, ClusterOps, CloudError, RegistryOps, RepositoryFormat,
    StorageOps,
};
use crate::error::ErrorKind;
use crate::poll::{OperationPoller, PollError, PollSettings};
use crate::progress::Reporter;
use crate::types::{ProjectId, ResourceKind, ResourceRef};

/// Desired state of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    /// A service API that must be enabled.
    Api { project: ProjectId, name: String },
    /// A storage bucket that must exist.
    Bucket {
        project: ProjectId,
        name: String,
        location: String,
    },
    /// A registry repository that must exist.
    Repository {
        project: ProjectId,
        name: String,
        location: String,
        format: RepositoryFormat,
    },
    /// A cluster that must already exist. Never created.
    Cluster(ClusterId),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Api { .. } => ResourceKind::Api,
            ResourceSpec::Bucket { .. } => ResourceKind::Bucket,
            ResourceSpec::Repository { .. } => ResourceKind::Repository,
            ResourceSpec::Cluster(_) => ResourceKind::Cluster,
        }
    }

    /// Human-readable identity used in logs and errors.
    pub fn identity(&self) -> String {
        match self {
            ResourceSpec::Api { project, name } => format!("api {name} on {project}"),
            ResourceSpec::Bucket { name, .. } => format!("bucket {name}"),
            ResourceSpec::Repository { name, location, .. } => {
                format!("repository {name} in {location}")
            }
            ResourceSpec::Cluster(cluster) => format!("cluster {cluster}"),
        }
    }
}

/// Proof that the target cluster was confirmed to exist.
///
/// Only the provisioner can produce one, so applying descriptors without a
/// prior existence check does not compile.
#[derive(Debug, Clone)]
pub struct ClusterConfirmed {
    cluster: ClusterId,
}

impl ClusterConfirmed {
    pub fn cluster(&self) -> &ClusterId {
        &self.cluster
    }
}

/// Wait limits for resources that are created asynchronously.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionSettings {
    pub api_enable: PollSettings,
    pub repository: PollSettings,
}

/// Errors from ensure-exists operations.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Reading current state failed (transport, permission). Distinct from absence.
    #[error("failed to read state of {resource}: {source}")]
    ReadState {
        resource: String,
        source: CloudError,
    },

    #[error("failed to create {resource}: {source}")]
    Create {
        resource: String,
        source: CloudError,
    },

    #[error("waiting for {resource} failed: {source}")]
    Wait { resource: String, source: PollError },

    #[error("cluster {cluster} does not exist; it must be created before deploying")]
    ClusterMissing { cluster: String },
}

impl ProvisionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::ReadState { source, .. } | ProvisionError::Create { source, .. } => {
                source.kind()
            }
            ProvisionError::Wait { source, .. } => source.kind(),
            ProvisionError::ClusterMissing { .. } => ErrorKind::Precondition,
        }
    }
}

/// Ensures resources exist, creating or enabling only what is missing.
pub struct Provisioner<'a, C> {
    cloud: &'a C,
    poller: &'a OperationPoller,
    reporter: &'a Reporter,
    settings: ProvisionSettings,
}

impl<'a, C> Provisioner<'a, C>
where
    C: ApiOps + StorageOps + RegistryOps + ClusterOps,
{
    pub fn new(
        cloud: &'a C,
        poller: &'a OperationPoller,
        reporter: &'a Reporter,
        settings: ProvisionSettings,
    ) -> Self {
        Self {
            cloud,
            poller,
            reporter,
            settings,
        }
    }

    /// Make the resource satisfy `spec` and return its reference.
    ///
    /// Calling this twice with the same spec returns the same reference and
    /// issues no creation call the second time.
    ///
    /// # Errors
    ///
    /// `ProvisionError::ClusterMissing` for a cluster spec whose cluster does
    /// not exist; other variants for remote failures.
    pub async fn ensure(&self, spec: &ResourceSpec) -> Result<ResourceRef, ProvisionError> {
        match spec {
            ResourceSpec::Api { project, name } => self.ensure_api(spec, project, name).await,
            ResourceSpec::Bucket {
                project,
                name,
                location,
            } => self.ensure_bucket(spec, project, name, location).await,
            ResourceSpec::Repository {
                project,
                name,
                location,
                format,
            } => {
                self.ensure_repository(spec, project, name, location, *format)
                    .await
            }
            ResourceSpec::Cluster(cluster) => {
                let confirmed = self.ensure_cluster(cluster).await?;
                Ok(ResourceRef::new(
                    ResourceKind::Cluster,
                    confirmed.cluster.to_string(),
                ))
            }
        }
    }

    /// Whether the cluster exists. Absence is `Ok(false)`.
    pub async fn cluster_exists(&self, cluster: &ClusterId) -> Result<bool, ProvisionError> {
        match self.cloud.cluster_exists(cluster).await {
            Ok(exists) => Ok(exists),
            Err(CloudError::NotFound(_)) => Ok(false),
            Err(source) => Err(ProvisionError::ReadState {
                resource: format!("cluster {cluster}"),
                source,
            }),
        }
    }

    /// Confirm the cluster exists, producing the token the applier requires.
    pub async fn ensure_cluster(
        &self,
        cluster: &ClusterId,
    ) -> Result<ClusterConfirmed, ProvisionError> {
        if !self.cluster_exists(cluster).await? {
            return Err(ProvisionError::ClusterMissing {
                cluster: format!("{} ({})", cluster.name, cluster.location),
            });
        }

        self.reporter
            .info(format!("cluster {} found in {}", cluster.name, cluster.location));
        Ok(ClusterConfirmed {
            cluster: cluster.clone(),
        })
    }

    async fn ensure_api(
        &self,
        spec: &ResourceSpec,
        project: &ProjectId,
        name: &str,
    ) -> Result<ResourceRef, ProvisionError> {
        let reference = ResourceRef::new(ResourceKind::Api, name);

        let state = self
            .cloud
            .api_state(project, name)
            .await
            .map_err(|source| read_error(spec, source))?;

        if state == ApiState::Enabled {
            debug!(api = name, "api already enabled");
            return Ok(reference);
        }

        self.reporter.info(format!("enabling {name}"));
        let operation = self
            .cloud
            .enable_api(project, name)
            .await
            .map_err(|source| create_error(spec, source))?;
        self.poller
            .wait(operation.as_ref(), self.settings.api_enable)
            .await
            .map_err(|source| wait_error(spec, source))?;

        info!(api = name, %project, "api enabled");
        Ok(reference)
    }

    async fn ensure_bucket(
        &self,
        spec: &ResourceSpec,
        project: &ProjectId,
        name: &str,
        location: &str,
    ) -> Result<ResourceRef, ProvisionError> {
        let existing = self
            .cloud
            .get_bucket(project, name)
            .await
            .map_err(|source| read_error(spec, source))?;

        if existing.is_some() {
            debug!(bucket = name, "bucket already exists");
            return Ok(ResourceRef::new(ResourceKind::Bucket, name));
        }

        self.reporter
            .info(format!("creating bucket {name} in {location}"));
        match self.cloud.create_bucket(project, name, location).await {
            Ok(bucket) => {
                info!(bucket = %bucket.name, location = %bucket.location, "bucket created");
                Ok(ResourceRef::new(ResourceKind::Bucket, bucket.name))
            }
            // Created concurrently between our read and our create.
            Err(CloudError::AlreadyExists(_)) => Ok(ResourceRef::new(ResourceKind::Bucket, name)),
            Err(source) => Err(create_error(spec, source)),
        }
    }

    async fn ensure_repository(
        &self,
        spec: &ResourceSpec,
        project: &ProjectId,
        name: &str,
        location: &str,
        format: RepositoryFormat,
    ) -> Result<ResourceRef, ProvisionError> {
        let existing = self
            .cloud
            .get_repository(project, location, name)
            .await
            .map_err(|source| read_error(spec, source))?;

        if let Some(repository) = existing {
            debug!(repository = name, url = %repository.url, "repository already exists");
            return Ok(ResourceRef::new(ResourceKind::Repository, repository.url));
        }

        self.reporter.info(format!(
            "creating {} repository {name} in {location}",
            format.as_str()
        ));
        let operation = match self
            .cloud
            .create_repository(project, location, name, format)
            .await
        {
            Ok(operation) => operation,
            Err(CloudError::AlreadyExists(_)) => {
                return self.reread_repository(spec, project, name, location).await;
            }
            Err(source) => return Err(create_error(spec, source)),
        };

        let repository = self
            .poller
            .wait(operation.as_ref(), self.settings.repository)
            .await
            .map_err(|source| wait_error(spec, source))?;

        info!(repository = name, url = %repository.url, "repository created");
        Ok(ResourceRef::new(ResourceKind::Repository, repository.url))
    }

    /// Re-read after losing a create race; the repository must be there now.
    async fn reread_repository(
        &self,
        spec: &ResourceSpec,
        project: &ProjectId,
        name: &str,
        location: &str,
    ) -> Result<ResourceRef, ProvisionError> {
        let repository = self
            .cloud
            .get_repository(project, location, name)
            .await
            .map_err(|source| read_error(spec, source))?
            .ok_or_else(|| {
                read_error(
                    spec,
                    CloudError::NotFound(format!("repository {name} vanished after conflict")),
                )
            })?;
        Ok(ResourceRef::new(ResourceKind::Repository, repository.url))
    }
}

fn read_error(spec: &ResourceSpec, source: CloudError) -> ProvisionError {
    ProvisionError::ReadState {
        resource: spec.identity(),
        source,
    }
}

fn create_error(spec: &ResourceSpec, source: CloudError) -> ProvisionError {
    ProvisionError::Create {
        resource: spec.identity(),
        source,
    }
}

fn wait_error(spec: &ResourceSpec, source: PollError) -> ProvisionError {
    ProvisionError::Wait {
        resource: spec.identity(),
        source,
    }
}

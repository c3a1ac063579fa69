// ABOUTME: State transition methods for rollout orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use tracing::info;

use crate::apply::DeploymentApplier;
use crate::build::BuildTrigger;
use crate::cloud::{ApiOps, BuildOps, ClusterOps, RegistryOps, RepositoryFormat, StorageOps};
use crate::manifest::ManifestGenerator;
use crate::package;
use crate::poll::{OperationPoller, PollSettings};
use crate::progress::Reporter;
use crate::provision::{ClusterConfirmed, Provisioner, ResourceSpec};
use crate::types::ImageRef;

use super::error::StageError;
use super::request::DeploymentResult;
use super::rollout::Rollout;
use super::state::{
    ApisEnabled, BucketReady, Deployed, ImageBuilt, Prepared, RegistryReady, SourcePackaged,
    SourceUploaded,
};

// =============================================================================
// Any state
// =============================================================================

impl<S> Rollout<S> {
    /// Confirm the target cluster exists.
    ///
    /// Not a state transition: where the check runs is a policy of the
    /// orchestrator, but applying descriptors needs the returned token.
    ///
    /// # Errors
    ///
    /// `ProvisionError::ClusterMissing` when the cluster does not exist.
    pub async fn confirm_cluster<C>(
        &self,
        provisioner: &Provisioner<'_, C>,
    ) -> Result<ClusterConfirmed, StageError>
    where
        C: ApiOps + StorageOps + RegistryOps + ClusterOps,
    {
        Ok(provisioner
            .ensure_cluster(&self.request.cluster_id())
            .await?)
    }
}

// =============================================================================
// Prepared -> ApisEnabled
// =============================================================================

impl Rollout<Prepared> {
    /// Enable every API in `apis`, skipping those already enabled.
    #[must_use = "rollout state must be used"]
    pub async fn enable_apis<C>(
        self,
        provisioner: &Provisioner<'_, C>,
        apis: &[String],
    ) -> Result<Rollout<ApisEnabled>, StageError>
    where
        C: ApiOps + StorageOps + RegistryOps + ClusterOps,
    {
        let mut enabled = Vec::with_capacity(apis.len());
        for api in apis {
            let spec = ResourceSpec::Api {
                project: self.project().clone(),
                name: api.clone(),
            };
            enabled.push(provisioner.ensure(&spec).await?);
        }
        Ok(self.advance(ApisEnabled { apis: enabled }))
    }
}

// =============================================================================
// ApisEnabled -> BucketReady
// =============================================================================

impl Rollout<ApisEnabled> {
    /// Make sure the source bucket exists in the request's region.
    #[must_use = "rollout state must be used"]
    pub async fn ensure_bucket<C>(
        self,
        provisioner: &Provisioner<'_, C>,
        bucket: &str,
    ) -> Result<Rollout<BucketReady>, StageError>
    where
        C: ApiOps + StorageOps + RegistryOps + ClusterOps,
    {
        let spec = ResourceSpec::Bucket {
            project: self.project().clone(),
            name: bucket.to_string(),
            location: self.request.region().to_string(),
        };
        let bucket = provisioner.ensure(&spec).await?;
        Ok(self.advance(BucketReady { bucket }))
    }
}

// =============================================================================
// BucketReady -> SourcePackaged
// =============================================================================

impl Rollout<BucketReady> {
    /// Bundle the request's files into one archive.
    #[must_use = "rollout state must be used"]
    pub async fn package_source(
        self,
        reporter: &Reporter,
    ) -> Result<Rollout<SourcePackaged>, StageError> {
        let files = self.request.files().iter().cloned().collect();
        let has_dockerfile = self.request.has_build_definition();
        let archive = package::package_async(files).await?;

        reporter.info(format!(
            "packaged {} files ({} bytes)",
            self.request.files().len(),
            archive.len()
        ));

        let bucket = self.state.bucket.clone();
        Ok(self.advance(SourcePackaged {
            bucket,
            archive,
            has_dockerfile,
        }))
    }
}

// =============================================================================
// SourcePackaged -> SourceUploaded
// =============================================================================

impl Rollout<SourcePackaged> {
    /// Upload the archive under the service's object key, replacing any previous upload.
    #[must_use = "rollout state must be used"]
    pub async fn upload_source<S: StorageOps>(
        self,
        storage: &S,
        reporter: &Reporter,
    ) -> Result<Rollout<SourceUploaded>, StageError> {
        let bucket = self.state.bucket.id().to_string();
        let key = self.service_name().source_object_key();

        let source = storage
            .upload_object(&bucket, &key, self.state.archive.clone())
            .await
            .map_err(|source| StageError::Upload {
                bucket: bucket.clone(),
                key: key.clone(),
                source,
            })?;

        info!(%source, bytes = self.state.archive.len(), "source uploaded");
        reporter.info(format!("uploaded source to {source}"));

        let has_dockerfile = self.state.has_dockerfile;
        Ok(self.advance(SourceUploaded {
            source,
            has_dockerfile,
        }))
    }
}

// =============================================================================
// SourceUploaded -> RegistryReady
// =============================================================================

impl Rollout<SourceUploaded> {
    /// Make sure the image repository exists and derive the image target from its push prefix.
    #[must_use = "rollout state must be used"]
    pub async fn ensure_registry<C>(
        self,
        provisioner: &Provisioner<'_, C>,
        repository: &str,
    ) -> Result<Rollout<RegistryReady>, StageError>
    where
        C: ApiOps + StorageOps + RegistryOps + ClusterOps,
    {
        let spec = ResourceSpec::Repository {
            project: self.project().clone(),
            name: repository.to_string(),
            location: self.request.region().to_string(),
            format: RepositoryFormat::Docker,
        };
        let repository = provisioner.ensure(&spec).await?;

        let target = ImageRef::in_repository(repository.id(), self.service_name()).map_err(
            |source| StageError::ImageTarget {
                repository: repository.id().to_string(),
                source,
            },
        )?;

        let SourceUploaded {
            source,
            has_dockerfile,
        } = self.state.clone();
        Ok(self.advance(RegistryReady {
            repository,
            source,
            has_dockerfile,
            target,
        }))
    }
}

// =============================================================================
// RegistryReady -> ImageBuilt
// =============================================================================

impl Rollout<RegistryReady> {
    /// Submit the remote build and wait for it to finish.
    ///
    /// The deployed image is pinned to the reported digest when there is one.
    #[must_use = "rollout state must be used"]
    pub async fn build_image<B: BuildOps>(
        self,
        trigger: &BuildTrigger<'_, B>,
        poller: &OperationPoller,
        wait: PollSettings,
    ) -> Result<Rollout<ImageBuilt>, StageError> {
        let operation = trigger
            .submit(
                self.project(),
                &self.state.source,
                &self.state.target,
                self.state.has_dockerfile,
            )
            .await?;

        let outcome = poller
            .wait(operation.as_ref(), wait)
            .await
            .map_err(StageError::BuildWait)?;

        info!(build = %outcome.build_id, digest = ?outcome.image_digest, "build finished");
        let image = match outcome.image_digest {
            Some(digest) => self.state.target.with_digest(digest),
            None => self.state.target.clone(),
        };
        Ok(self.advance(ImageBuilt { image }))
    }
}

// =============================================================================
// ImageBuilt -> Deployed
// =============================================================================

impl Rollout<ImageBuilt> {
    /// Generate and apply descriptors, then wait for the external address.
    #[must_use = "rollout state must be used"]
    pub async fn apply_manifests<C: ClusterOps>(
        self,
        applier: &DeploymentApplier<'_, C>,
        generator: &ManifestGenerator,
        confirmed: &ClusterConfirmed,
    ) -> Result<Rollout<Deployed>, StageError> {
        let manifests = generator.generate(self.service_name(), &self.state.image);
        let url = applier.apply(confirmed, &manifests).await?;
        Ok(self.advance(Deployed { url }))
    }
}

// =============================================================================
// Deployed -> result
// =============================================================================

impl Rollout<Deployed> {
    pub fn finish(self) -> DeploymentResult {
        DeploymentResult {
            service_name: self.request.service().clone(),
            url: self.state.url,
        }
    }
}

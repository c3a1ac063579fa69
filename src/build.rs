// ABOUTME: Remote build submission for uploaded sources.
// ABOUTME: Picks Dockerfile or buildpacks strategy and returns the build operation.

use std::time::Duration;

use tracing::info;

use crate::cloud::{
    BoxedOperation, BuildOps, BuildOutcome, BuildRequest, BuildStep, CloudError, SourceLocation,
};
use crate::error::ErrorKind;
use crate::progress::Reporter;
use crate::types::{ImageRef, ProjectId};

/// Builder image that runs `docker build`.
pub const DOCKER_BUILDER: &str = "gcr.io/cloud-builders/docker";

/// Builder image that carries the `pack` CLI.
pub const PACK_BUILDER: &str = "gcr.io/k8s-skaffold/pack";

/// Default buildpacks builder used when the source has no Dockerfile.
pub const DEFAULT_BUILDPACKS_BUILDER: &str = "gcr.io/buildpacks/builder:latest";

/// How the container image gets built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// The source ships its own Dockerfile.
    Dockerfile,
    /// No Dockerfile: let buildpacks detect the language and build.
    Buildpacks,
}

impl BuildStrategy {
    pub fn select(has_dockerfile: bool) -> Self {
        if has_dockerfile {
            BuildStrategy::Dockerfile
        } else {
            BuildStrategy::Buildpacks
        }
    }
}

/// Remote build parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Limit enforced by the build service itself.
    pub timeout: Duration,
    /// Builder used by the buildpacks strategy.
    pub buildpacks_builder: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20 * 60),
            buildpacks_builder: DEFAULT_BUILDPACKS_BUILDER.to_string(),
        }
    }
}

/// Errors from build submission.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to submit build for {source_location}: {source}")]
    Submit {
        source_location: String,
        source: CloudError,
    },
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Submit { source, .. } => source.kind(),
        }
    }
}

/// Describe the build job for `source` producing `target`.
pub fn build_request(
    source: &SourceLocation,
    target: &ImageRef,
    strategy: BuildStrategy,
    settings: &BuildSettings,
) -> BuildRequest {
    let image = target.to_string();

    let (steps, images) = match strategy {
        BuildStrategy::Dockerfile => (
            vec![BuildStep {
                name: DOCKER_BUILDER.to_string(),
                args: vec![
                    "build".to_string(),
                    "-t".to_string(),
                    image.clone(),
                    ".".to_string(),
                ],
                entrypoint: None,
            }],
            vec![image],
        ),
        // pack pushes the image itself, so nothing is listed for the service to push.
        BuildStrategy::Buildpacks => (
            vec![BuildStep {
                name: PACK_BUILDER.to_string(),
                args: vec![
                    "build".to_string(),
                    image,
                    "--builder".to_string(),
                    settings.buildpacks_builder.clone(),
                    "--network".to_string(),
                    "cloudbuild".to_string(),
                    "--publish".to_string(),
                ],
                entrypoint: Some("pack".to_string()),
            }],
            Vec::new(),
        ),
    };

    BuildRequest {
        source: source.clone(),
        steps,
        images,
        timeout: settings.timeout,
    }
}

/// Submits builds; waiting is left to the caller.
pub struct BuildTrigger<'a, B> {
    builds: &'a B,
    reporter: &'a Reporter,
    settings: &'a BuildSettings,
}

impl<'a, B: BuildOps> BuildTrigger<'a, B> {
    pub fn new(builds: &'a B, reporter: &'a Reporter, settings: &'a BuildSettings) -> Self {
        Self {
            builds,
            reporter,
            settings,
        }
    }

    /// Submit a build of `source` that produces `target`.
    pub async fn submit(
        &self,
        project: &ProjectId,
        source: &SourceLocation,
        target: &ImageRef,
        has_dockerfile: bool,
    ) -> Result<BoxedOperation<BuildOutcome>, BuildError> {
        let strategy = BuildStrategy::select(has_dockerfile);
        let request = build_request(source, target, strategy, self.settings);

        let operation = self
            .builds
            .submit_build(project, &request)
            .await
            .map_err(|source| BuildError::Submit {
                source_location: request.source.to_string(),
                source,
            })?;

        info!(build = operation.name(), ?strategy, image = %target, "build submitted");
        self.reporter.info(format!(
            "build {} submitted ({} strategy)",
            operation.name(),
            match strategy {
                BuildStrategy::Dockerfile => "Dockerfile",
                BuildStrategy::Buildpacks => "buildpacks",
            }
        ));
        Ok(operation)
    }
}

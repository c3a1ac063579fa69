// ABOUTME: Shared types used across cloud capability traits.
// ABOUTME: Bucket, repository, build, and cluster descriptions exchanged with adapters.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::types::ProjectId;

/// Whether a service API is enabled on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiState {
    Enabled,
    Disabled,
}

/// A storage bucket as reported by the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    pub name: String,
    pub location: String,
}

/// Package format of a registry repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepositoryFormat {
    #[default]
    Docker,
}

impl RepositoryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryFormat::Docker => "docker",
        }
    }
}

/// A registry repository as reported by the registry service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub name: String,
    /// Push/pull prefix, e.g. `us-central1-docker.pkg.dev/project/repo`.
    pub url: String,
}

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub bucket: String,
    pub object: String,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object)
    }
}

/// A single step of a remote build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStep {
    /// Builder image that runs the step.
    pub name: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
}

/// A build job submission.
///
/// Serializes to the build service's config document (steps, images, timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    #[serde(skip)]
    pub source: SourceLocation,
    pub steps: Vec<BuildStep>,
    /// Images the build service pushes after the steps succeed.
    pub images: Vec<String>,
    #[serde(serialize_with = "serialize_seconds")]
    pub timeout: Duration,
}

fn serialize_seconds<S: serde::Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{}s", value.as_secs()))
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub build_id: String,
    /// Digest of the pushed image, when the build service reports one.
    pub image_digest: Option<String>,
}

/// Identity of a managed cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterId {
    pub project: ProjectId,
    pub location: String,
    pub name: String,
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/clusters/{}",
            self.project, self.location, self.name
        )
    }
}

/// Credentials scope for talking to a cluster's control plane.
///
/// Adapters that need on-disk credentials attach a kubeconfig file whose
/// lifetime is tied to this value.
#[derive(Debug, Clone)]
pub struct ClusterAccess {
    cluster: ClusterId,
    kubeconfig: Option<Arc<tempfile::TempPath>>,
}

impl ClusterAccess {
    pub fn new(cluster: ClusterId) -> Self {
        Self {
            cluster,
            kubeconfig: None,
        }
    }

    pub fn with_kubeconfig(mut self, path: tempfile::TempPath) -> Self {
        self.kubeconfig = Some(Arc::new(path));
        self
    }

    pub fn cluster(&self) -> &ClusterId {
        &self.cluster
    }

    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref().map(|p| &**p)
    }
}

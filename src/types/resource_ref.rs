// ABOUTME: Opaque references to provisioned cloud resources.
// ABOUTME: Returned by ensure-exists operations and immutable once created.

use serde::Serialize;
use std::fmt;

/// The kinds of resource the pipeline provisions or checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Api,
    Bucket,
    Repository,
    Image,
    Cluster,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Api => "api",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Repository => "repository",
            ResourceKind::Image => "image",
            ResourceKind::Cluster => "cluster",
        };
        f.write_str(name)
    }
}

/// Identifier of a resource that is known to exist.
///
/// The identifier is whatever the owning service uses to address the resource:
/// an API name, a bucket name, a repository URL, or an image URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[must_use = "resource references identify remote state and should not be ignored"]
pub struct ResourceRef {
    kind: ResourceKind,
    id: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ABOUTME: Rollout state types for the type state pattern.
// ABOUTME: Each state carries the outputs earlier stages produced.

use bytes::Bytes;

use crate::cloud::SourceLocation;
use crate::types::{ImageRef, ResourceRef};

/// Initial state: request validated, nothing remote touched yet.
/// Available actions: `enable_apis()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Prepared;

/// Required APIs are enabled.
/// Available actions: `ensure_bucket()`
#[derive(Debug, Clone)]
pub struct ApisEnabled {
    pub(crate) apis: Vec<ResourceRef>,
}

impl ApisEnabled {
    pub fn apis(&self) -> &[ResourceRef] {
        &self.apis
    }
}

/// Source bucket exists.
/// Available actions: `package_source()`
#[derive(Debug, Clone)]
pub struct BucketReady {
    pub(crate) bucket: ResourceRef,
}

impl BucketReady {
    pub fn bucket(&self) -> &ResourceRef {
        &self.bucket
    }
}

/// Source archive built in memory.
/// Available actions: `upload_source()`
#[derive(Debug, Clone)]
pub struct SourcePackaged {
    pub(crate) bucket: ResourceRef,
    pub(crate) archive: Bytes,
    pub(crate) has_dockerfile: bool,
}

impl SourcePackaged {
    pub fn archive(&self) -> &Bytes {
        &self.archive
    }
}

/// Archive uploaded to the bucket.
/// Available actions: `ensure_registry()`
#[derive(Debug, Clone)]
pub struct SourceUploaded {
    pub(crate) source: SourceLocation,
    pub(crate) has_dockerfile: bool,
}

impl SourceUploaded {
    pub fn source(&self) -> &SourceLocation {
        &self.source
    }
}

/// Registry repository exists; the image target is known.
/// Available actions: `build_image()`
#[derive(Debug, Clone)]
pub struct RegistryReady {
    pub(crate) repository: ResourceRef,
    pub(crate) source: SourceLocation,
    pub(crate) has_dockerfile: bool,
    pub(crate) target: ImageRef,
}

impl RegistryReady {
    pub fn repository(&self) -> &ResourceRef {
        &self.repository
    }

    pub fn target(&self) -> &ImageRef {
        &self.target
    }
}

/// Image built and pushed.
/// Available actions: `apply_manifests()`
#[derive(Debug, Clone)]
pub struct ImageBuilt {
    pub(crate) image: ImageRef,
}

impl ImageBuilt {
    pub fn image(&self) -> &ImageRef {
        &self.image
    }
}

/// Descriptors applied and the service is reachable.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Deployed {
    pub(crate) url: String,
}

impl Deployed {
    pub fn url(&self) -> &str {
        &self.url
    }
}

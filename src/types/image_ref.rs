// ABOUTME: Container image reference parsing and construction.
// ABOUTME: Builds registry image targets and parses forms like repo/name:tag@digest.

use std::fmt;
use thiserror::Error;

use super::{ProjectId, ServiceName};

/// Tag applied to images built by the pipeline.
pub const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    /// Image target for a service inside a regional docker repository.
    ///
    /// Produces `<region>-docker.pkg.dev/<project>/<repository>/<service>:latest`.
    pub fn for_service(
        region: &str,
        project: &ProjectId,
        repository: &str,
        service: &ServiceName,
    ) -> Self {
        Self {
            registry: Some(format!("{region}-docker.pkg.dev")),
            name: format!("{project}/{repository}/{service}"),
            tag: Some(DEFAULT_TAG.to_string()),
            digest: None,
        }
    }

    /// Image target for a service under a repository's push prefix,
    /// e.g. `europe-docker.pkg.dev/<project>/<repository>`.
    pub fn in_repository(
        repository_url: &str,
        service: &ServiceName,
    ) -> Result<Self, ParseImageRefError> {
        let prefix = repository_url.trim().trim_end_matches('/');
        Self::parse(&format!("{prefix}/{service}:{DEFAULT_TAG}"))
    }

    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@'))
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) => (before, Some(after.to_string())),
            None => (input, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, Some(after.to_string())),
            _ => (without_digest, None),
        };

        if without_tag.is_empty() || without_tag.ends_with('/') {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        let (registry, name) = split_registry(without_tag);

        let tag = match (tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            (tag, _) => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Pin this reference to a digest reported by the builder.
    pub fn with_digest(&self, digest: impl Into<String>) -> Self {
        Self {
            digest: Some(digest.into()),
            ..self.clone()
        }
    }
}

/// The first path component is a registry when it looks like a host.
fn split_registry(input: &str) -> (Option<String>, String) {
    match input.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (Some(first.to_string()), rest.to_string())
        }
        _ => (None, input.to_string()),
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

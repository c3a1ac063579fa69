// ABOUTME: Validated deployment input and the successful outcome.
// ABOUTME: Construction rejects malformed requests before any remote call.

use nonempty::NonEmpty;
use serde::Serialize;
use thiserror::Error;

use crate::cloud::ClusterId;
use crate::error::ErrorKind;
use crate::package::{self, PackageError, SourceFile};
use crate::types::{ProjectId, ProjectIdError, ServiceName, ServiceNameError};

/// Errors raised while validating a request, before anything remote happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid project id: {0}")]
    Project(#[from] ProjectIdError),

    #[error("invalid service name: {0}")]
    Service(#[from] ServiceNameError),

    #[error("{field} cannot be empty")]
    Missing { field: &'static str },

    #[error("invalid {field} {value:?}: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("invalid source files: {0}")]
    Files(#[from] PackageError),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Everything one pipeline run needs from its caller.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    project: ProjectId,
    region: String,
    cluster: String,
    service: ServiceName,
    files: NonEmpty<SourceFile>,
}

impl DeploymentRequest {
    /// Validate and assemble a request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed project, region, cluster,
    /// service name, or file list.
    pub fn new(
        project: &str,
        region: &str,
        cluster: &str,
        service: &str,
        files: Vec<SourceFile>,
    ) -> Result<Self, ValidationError> {
        let project = ProjectId::new(project)?;
        let region = validate_location("region", region)?;
        let cluster = validate_location("cluster", cluster)?;
        let service = ServiceName::new(service)?;

        package::validate_names(&files)?;
        let files = NonEmpty::from_vec(files).ok_or(PackageError::Empty)?;

        Ok(Self {
            project,
            region,
            cluster,
            service,
            files,
        })
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn files(&self) -> &NonEmpty<SourceFile> {
        &self.files
    }

    /// The target cluster, located in the request's region.
    pub fn cluster_id(&self) -> ClusterId {
        ClusterId {
            project: self.project.clone(),
            location: self.region.clone(),
            name: self.cluster.clone(),
        }
    }

    pub fn has_build_definition(&self) -> bool {
        package::has_build_definition(self.files.iter())
    }
}

/// Regions and cluster names share the same shape: lowercase, digits, hyphens.
fn validate_location(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing { field });
    }

    let invalid = |reason| ValidationError::Invalid {
        field,
        value: value.to_string(),
        reason,
    };

    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("only lowercase letters, digits and hyphens are allowed"));
    }
    if value.starts_with('-') || value.ends_with('-') {
        return Err(invalid("cannot start or end with a hyphen"));
    }

    Ok(value.to_string())
}

/// A deployed service and where to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub service_name: ServiceName,
    pub url: String,
}

// ABOUTME: Cloud capability adapter that shells out to gcloud and kubectl.
// ABOUTME: Parses --format=json output and keeps kubectl credentials per invocation.

mod command;
mod error;
mod operation;

use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use command::CliCommand;
use operation::{BuildDoc, BuildHandle, LongRunning, OperationDoc};

use super::{
    ApiOps, ApiState, BoxedOperation, BucketInfo, BuildOps, BuildOutcome, BuildRequest,
    CloudError, ClusterAccess, ClusterId, ClusterOps, CompletedOperation, RegistryOps,
    RepositoryFormat, RepositoryInfo, SourceLocation, StorageOps,
};
use crate::manifest::Descriptor;
use crate::types::ProjectId;

/// Talks to Google Cloud through the `gcloud` and `kubectl` binaries.
///
/// Authentication is whatever the installed CLIs are logged in as.
#[derive(Debug, Clone)]
pub struct GcloudCli {
    gcloud: String,
    kubectl: String,
}

impl Default for GcloudCli {
    fn default() -> Self {
        Self {
            gcloud: "gcloud".to_string(),
            kubectl: "kubectl".to_string(),
        }
    }
}

impl GcloudCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use specific binaries instead of looking them up on `PATH`.
    pub fn with_programs(gcloud: impl Into<String>, kubectl: impl Into<String>) -> Self {
        Self {
            gcloud: gcloud.into(),
            kubectl: kubectl.into(),
        }
    }

    fn gcloud(&self, project: &ProjectId) -> CliCommand {
        CliCommand::new(&self.gcloud).args([
            "--project",
            project.as_str(),
            "--format=json",
            "--quiet",
        ])
    }

    fn kubectl(&self, access: &ClusterAccess) -> Result<CliCommand, CloudError> {
        let kubeconfig = access.kubeconfig().ok_or_else(|| {
            CloudError::Permanent(format!("no credentials fetched for {}", access.cluster()))
        })?;
        Ok(CliCommand::new(&self.kubectl).env("KUBECONFIG", kubeconfig))
    }
}

/// `Ok(None)` for not-found, so reads separate absence from failure.
fn absent_if_not_found<T>(result: Result<T, CloudError>) -> Result<Option<T>, CloudError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CloudError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Deserialize)]
struct BucketDoc {
    name: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct ServiceDoc {
    #[serde(default)]
    status: ServiceStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceStatus {
    #[serde(default)]
    load_balancer: LoadBalancerStatus,
}

#[derive(Debug, Default, Deserialize)]
struct LoadBalancerStatus {
    #[serde(default)]
    ingress: Vec<Ingress>,
}

#[derive(Debug, Deserialize)]
struct Ingress {
    ip: Option<String>,
    hostname: Option<String>,
}

fn repository_url(project: &ProjectId, location: &str, name: &str) -> String {
    format!("{location}-docker.pkg.dev/{project}/{name}")
}

#[async_trait]
impl ApiOps for GcloudCli {
    async fn api_state(&self, project: &ProjectId, api: &str) -> Result<ApiState, CloudError> {
        let enabled: Vec<serde_json::Value> = self
            .gcloud(project)
            .args(["services", "list", "--enabled"])
            .arg(format!("--filter=config.name={api}"))
            .json()
            .await?;
        Ok(if enabled.is_empty() {
            ApiState::Disabled
        } else {
            ApiState::Enabled
        })
    }

    async fn enable_api(
        &self,
        project: &ProjectId,
        api: &str,
    ) -> Result<BoxedOperation<()>, CloudError> {
        let stdout = self
            .gcloud(project)
            .args(["services", "enable", api, "--async"])
            .output()
            .await?;

        // Nothing to wait for when the service enabled it synchronously.
        let Ok(doc) = serde_json::from_str::<OperationDoc>(&stdout) else {
            return Ok(CompletedOperation::boxed(format!("enable {api}"), ()));
        };
        if doc.done || doc.name.is_empty() {
            return Ok(CompletedOperation::boxed(format!("enable {api}"), ()));
        }

        let describe = self
            .gcloud(project)
            .args(["services", "operations", "describe", doc.name.as_str()]);
        Ok(Box::new(LongRunning::new(doc.name, describe, ())))
    }
}

#[async_trait]
impl StorageOps for GcloudCli {
    async fn get_bucket(
        &self,
        project: &ProjectId,
        name: &str,
    ) -> Result<Option<BucketInfo>, CloudError> {
        let doc = absent_if_not_found(
            self.gcloud(project)
                .args(["storage", "buckets", "describe"])
                .arg(format!("gs://{name}"))
                .json::<BucketDoc>()
                .await,
        )?;
        Ok(doc.map(|d| BucketInfo {
            name: d.name,
            location: d.location.to_ascii_lowercase(),
        }))
    }

    async fn create_bucket(
        &self,
        project: &ProjectId,
        name: &str,
        location: &str,
    ) -> Result<BucketInfo, CloudError> {
        self.gcloud(project)
            .args(["storage", "buckets", "create"])
            .arg(format!("gs://{name}"))
            .args(["--location", location, "--uniform-bucket-level-access"])
            .output()
            .await?;
        Ok(BucketInfo {
            name: name.to_string(),
            location: location.to_string(),
        })
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<SourceLocation, CloudError> {
        let location = SourceLocation {
            bucket: bucket.to_string(),
            object: key.to_string(),
        };
        CliCommand::new(&self.gcloud)
            .args(["storage", "cp", "-"])
            .arg(location.to_string())
            .stdin(data)
            .output()
            .await?;
        Ok(location)
    }
}

#[async_trait]
impl RegistryOps for GcloudCli {
    async fn get_repository(
        &self,
        project: &ProjectId,
        location: &str,
        name: &str,
    ) -> Result<Option<RepositoryInfo>, CloudError> {
        let doc = absent_if_not_found(
            self.gcloud(project)
                .args(["artifacts", "repositories", "describe", name, "--location", location])
                .json::<serde_json::Value>()
                .await,
        )?;
        Ok(doc.map(|_| RepositoryInfo {
            name: name.to_string(),
            url: repository_url(project, location, name),
        }))
    }

    async fn create_repository(
        &self,
        project: &ProjectId,
        location: &str,
        name: &str,
        format: RepositoryFormat,
    ) -> Result<BoxedOperation<RepositoryInfo>, CloudError> {
        let info = RepositoryInfo {
            name: name.to_string(),
            url: repository_url(project, location, name),
        };
        let stdout = self
            .gcloud(project)
            .args(["artifacts", "repositories", "create", name, "--location", location])
            .arg(format!("--repository-format={}", format.as_str()))
            .arg("--async")
            .output()
            .await?;

        let Ok(doc) = serde_json::from_str::<OperationDoc>(&stdout) else {
            return Ok(CompletedOperation::boxed(format!("create repository {name}"), info));
        };
        if doc.done || doc.name.is_empty() {
            return Ok(CompletedOperation::boxed(format!("create repository {name}"), info));
        }

        let operation_id = doc.name.rsplit('/').next().unwrap_or(&doc.name).to_string();
        let describe = self.gcloud(project).args([
            "artifacts",
            "operations",
            "describe",
            operation_id.as_str(),
            "--location",
            location,
        ]);
        Ok(Box::new(LongRunning::new(doc.name, describe, info)))
    }
}

#[async_trait]
impl BuildOps for GcloudCli {
    async fn submit_build(
        &self,
        project: &ProjectId,
        request: &BuildRequest,
    ) -> Result<BoxedOperation<BuildOutcome>, CloudError> {
        let config = serde_json::to_vec(request)
            .map_err(|e| CloudError::Permanent(format!("invalid build config: {e}")))?;
        let mut file = tempfile::Builder::new()
            .prefix("hoist-build-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| CloudError::Permanent(format!("failed to write build config: {e}")))?;
        file.write_all(&config)
            .map_err(|e| CloudError::Permanent(format!("failed to write build config: {e}")))?;

        let doc: BuildDoc = self
            .gcloud(project)
            .args(["builds", "submit"])
            .arg(request.source.to_string())
            .arg(format!("--config={}", file.path().display()))
            .arg("--async")
            .json()
            .await?;
        debug!(build = %doc.id, "build queued");

        let describe = self
            .gcloud(project)
            .args(["builds", "describe", doc.id.as_str()]);
        Ok(Box::new(BuildHandle::new(doc.id, describe)))
    }
}

#[async_trait]
impl ClusterOps for GcloudCli {
    async fn cluster_exists(&self, cluster: &ClusterId) -> Result<bool, CloudError> {
        let doc = absent_if_not_found(
            self.gcloud(&cluster.project)
                .args([
                    "container",
                    "clusters",
                    "describe",
                    cluster.name.as_str(),
                    "--location",
                    cluster.location.as_str(),
                ])
                .json::<serde_json::Value>()
                .await,
        )?;
        Ok(doc.is_some())
    }

    async fn fetch_credentials(&self, cluster: &ClusterId) -> Result<ClusterAccess, CloudError> {
        let kubeconfig = tempfile::Builder::new()
            .prefix("hoist-kubeconfig-")
            .tempfile()
            .map_err(|e| CloudError::Permanent(format!("failed to create kubeconfig: {e}")))?
            .into_temp_path();

        self.gcloud(&cluster.project)
            .args([
                "container",
                "clusters",
                "get-credentials",
                cluster.name.as_str(),
                "--location",
                cluster.location.as_str(),
            ])
            .env("KUBECONFIG", kubeconfig.as_os_str())
            .output()
            .await?;

        Ok(ClusterAccess::new(cluster.clone()).with_kubeconfig(kubeconfig))
    }

    async fn apply_descriptor(
        &self,
        access: &ClusterAccess,
        descriptor: &Descriptor,
    ) -> Result<(), CloudError> {
        let yaml = descriptor
            .to_yaml()
            .map_err(|e| CloudError::Permanent(format!("failed to render descriptor: {e}")))?;
        let stdout = self
            .kubectl(access)?
            .args(["apply", "-f", "-"])
            .stdin(Bytes::from(yaml))
            .output()
            .await?;
        debug!(output = %stdout.trim(), "descriptor applied");
        Ok(())
    }

    async fn external_address(
        &self,
        access: &ClusterAccess,
        service: &str,
    ) -> Result<Option<String>, CloudError> {
        let doc: ServiceDoc = self
            .kubectl(access)?
            .args(["get", "service", service, "-o", "json"])
            .json()
            .await?;
        Ok(doc
            .status
            .load_balancer
            .ingress
            .into_iter()
            .find_map(|i| i.ip.or(i.hostname)))
    }
}

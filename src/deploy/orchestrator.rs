// ABOUTME: Drives the deployment stages in order for one request.
// ABOUTME: Fail-fast, cancellable between stages, no rollback of created resources.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::apply::DeploymentApplier;
use crate::build::{BuildSettings, BuildTrigger};
use crate::cloud::CloudOps;
use crate::error::ErrorKind;
use crate::manifest::{ManifestGenerator, ManifestSettings};
use crate::poll::{OperationPoller, PollSettings};
use crate::progress::{NullSink, ProgressSink, Reporter};
use crate::provision::{ProvisionSettings, Provisioner};
use crate::types::ProjectId;

use super::error::{DeployError, StageError, StageSnafu, ValidationSnafu};
use super::request::{DeploymentRequest, DeploymentResult, ValidationError};
use super::rollout::Rollout;
use super::stage::{ClusterCheck, Stage, StageResult, StageTracker};

/// APIs enabled on the project before anything else runs.
pub const DEFAULT_APIS: &[&str] = &[
    "cloudbuild.googleapis.com",
    "artifactregistry.googleapis.com",
    "container.googleapis.com",
    "storage.googleapis.com",
];

/// Registry repository that receives built images.
pub const DEFAULT_REPOSITORY: &str = "hoist";

/// Extra wait past the build service's own limit, for time spent queued.
pub const BUILD_QUEUE_ALLOWANCE: Duration = Duration::from_secs(5 * 60);

/// Wait limits for every polled stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub api_enable: PollSettings,
    pub repository: PollSettings,
    pub build: PollSettings,
    pub address: PollSettings,
}

impl Timeouts {
    fn validate(&self) -> Result<(), ValidationError> {
        let waits = [
            ("api_enable", self.api_enable),
            ("repository", self.repository),
            ("build", self.build),
            ("address", self.address),
        ];
        for (field, wait) in waits {
            if wait.interval.is_zero() {
                return Err(ValidationError::Invalid {
                    field,
                    value: "0s".to_string(),
                    reason: "poll interval must be greater than zero",
                });
            }
        }
        Ok(())
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        let interval = Duration::from_secs(2);
        Self {
            api_enable: PollSettings::new(Duration::from_secs(5 * 60), interval),
            repository: PollSettings::new(Duration::from_secs(5 * 60), interval),
            build: PollSettings::new(
                Duration::from_secs(20 * 60) + BUILD_QUEUE_ALLOWANCE,
                interval,
            ),
            address: PollSettings::new(Duration::from_secs(10 * 60), interval),
        }
    }
}

/// Pipeline settings shared by every run of one orchestrator.
#[derive(Debug, Clone)]
pub struct Settings {
    pub apis: Vec<String>,
    /// Source bucket; `<project>-hoist-sources` when unset.
    pub bucket: Option<String>,
    pub repository: String,
    pub manifest: ManifestSettings,
    pub build: BuildSettings,
    pub cluster_check: ClusterCheck,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            apis: DEFAULT_APIS.iter().map(|s| s.to_string()).collect(),
            bucket: None,
            repository: DEFAULT_REPOSITORY.to_string(),
            manifest: ManifestSettings::default(),
            build: BuildSettings::default(),
            cluster_check: ClusterCheck::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// Bucket the source archive is uploaded to for `project`.
    pub fn bucket_name(&self, project: &ProjectId) -> String {
        self.bucket
            .clone()
            .unwrap_or_else(|| format!("{project}-hoist-sources"))
    }

    fn provision(&self) -> ProvisionSettings {
        ProvisionSettings {
            api_enable: self.timeouts.api_enable,
            repository: self.timeouts.repository,
        }
    }

    /// Check derived resource names before anything remote happens.
    pub fn validate(&self, request: &DeploymentRequest) -> Result<(), ValidationError> {
        let bucket = self.bucket_name(request.project());
        check_name("bucket", &bucket, 3, 63, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')
        })?;
        check_name("repository", &self.repository, 1, 63, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
        })?;
        if self.apis.iter().any(|api| api.trim().is_empty()) {
            return Err(ValidationError::Missing { field: "api name" });
        }
        self.timeouts.validate()?;
        if self.manifest.replicas == 0 {
            return Err(ValidationError::Invalid {
                field: "replicas",
                value: "0".to_string(),
                reason: "at least one replica is required",
            });
        }
        if self.manifest.container_port == 0 {
            return Err(ValidationError::Invalid {
                field: "container_port",
                value: "0".to_string(),
                reason: "port must be between 1 and 65535",
            });
        }
        Ok(())
    }
}

fn check_name(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    allowed: impl Fn(char) -> bool,
) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::Invalid {
        field,
        value: value.to_string(),
        reason,
    };

    if value.len() < min || value.len() > max {
        return Err(invalid("length out of range"));
    }
    if !value.chars().all(allowed) {
        return Err(invalid("contains characters that are not allowed"));
    }
    if !value.starts_with(|c: char| c.is_ascii_alphanumeric())
        || !value.ends_with(|c: char| c.is_ascii_alphanumeric())
    {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}

/// Outcome of a run together with the status of every planned stage.
#[derive(Debug)]
pub struct DeploymentReport {
    pub correlation_id: Uuid,
    pub stages: Vec<StageResult>,
    pub outcome: Result<DeploymentResult, DeployError>,
}

/// Runs deployment requests against one cloud adapter.
///
/// The orchestrator holds no per-run state; concurrent runs are independent
/// and each gets its own correlation id, poller and stage tracker.
pub struct Orchestrator<C> {
    cloud: Arc<C>,
    settings: Settings,
}

impl<C: CloudOps> Orchestrator<C> {
    pub fn new(cloud: Arc<C>, settings: Settings) -> Self {
        Self { cloud, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Deploy without progress reporting or cancellation.
    ///
    /// # Errors
    ///
    /// Returns `DeployError` naming the failed stage.
    pub async fn run(&self, request: DeploymentRequest) -> Result<DeploymentResult, DeployError> {
        self.run_with(request, Arc::new(NullSink), CancellationToken::new())
            .await
    }

    /// Deploy, reporting progress to `sink` and stopping when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns `DeployError` naming the failed stage, or `DeployError::Cancelled`.
    pub async fn run_with(
        &self,
        request: DeploymentRequest,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<DeploymentResult, DeployError> {
        self.run_tracked(request, sink, cancel).await.outcome
    }

    /// Deploy and return the per-stage status alongside the outcome.
    pub async fn run_tracked(
        &self,
        request: DeploymentRequest,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> DeploymentReport {
        let invocation = Invocation {
            poller: OperationPoller::new(cancel),
            reporter: Reporter::new(sink),
            tracker: Mutex::new(StageTracker::new(&Stage::plan(
                self.settings.cluster_check,
            ))),
        };

        info!(
            correlation_id = %invocation.reporter.correlation_id(),
            service = %request.service(),
            project = %request.project(),
            "deployment started"
        );
        let outcome = self.execute(&invocation, request).await;

        match &outcome {
            Ok(result) => invocation
                .reporter
                .info(format!("deployed {} at {}", result.service_name, result.url)),
            Err(e) => invocation.reporter.error(e.to_string()),
        }

        DeploymentReport {
            correlation_id: invocation.reporter.correlation_id(),
            stages: invocation.tracker.into_inner().into_results(),
            outcome,
        }
    }

    async fn execute(
        &self,
        run: &Invocation,
        request: DeploymentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        self.settings.validate(&request).context(ValidationSnafu)?;

        let cloud = self.cloud.as_ref();
        let settings = &self.settings;
        let provisioner = Provisioner::new(cloud, &run.poller, &run.reporter, settings.provision());
        let bucket = settings.bucket_name(request.project());
        let rollout = Rollout::new(request);

        let rollout = run
            .stage(
                Stage::EnableApis,
                rollout.enable_apis(&provisioner, &settings.apis),
            )
            .await?;
        let rollout = run
            .stage(
                Stage::EnsureBucket,
                rollout.ensure_bucket(&provisioner, &bucket),
            )
            .await?;
        let rollout = run
            .stage(Stage::PackageSource, rollout.package_source(&run.reporter))
            .await?;
        let rollout = run
            .stage(
                Stage::UploadSource,
                rollout.upload_source(cloud, &run.reporter),
            )
            .await?;
        let rollout = run
            .stage(
                Stage::EnsureRegistry,
                rollout.ensure_registry(&provisioner, &settings.repository),
            )
            .await?;

        let early = match settings.cluster_check {
            ClusterCheck::BeforeBuild => Some(
                run.stage(Stage::EnsureCluster, rollout.confirm_cluster(&provisioner))
                    .await?,
            ),
            ClusterCheck::BeforeApply => None,
        };

        let trigger = BuildTrigger::new(cloud, &run.reporter, &settings.build);
        let rollout = run
            .stage(
                Stage::TriggerBuild,
                rollout.build_image(&trigger, &run.poller, settings.timeouts.build),
            )
            .await?;

        let confirmed = match early {
            Some(confirmed) => confirmed,
            None => {
                run.stage(Stage::EnsureCluster, rollout.confirm_cluster(&provisioner))
                    .await?
            }
        };

        let applier =
            DeploymentApplier::new(cloud, &run.poller, &run.reporter, settings.timeouts.address);
        let generator = ManifestGenerator::new(settings.manifest);
        let rollout = run
            .stage(
                Stage::ApplyManifests,
                rollout.apply_manifests(&applier, &generator, &confirmed),
            )
            .await?;

        Ok(rollout.finish())
    }
}

/// Per-run state: one poller, one reporter, one tracker.
struct Invocation {
    poller: OperationPoller,
    reporter: Reporter,
    tracker: Mutex<StageTracker>,
}

impl Invocation {
    /// Run one stage: check for cancellation, record status, report progress.
    async fn stage<T, F>(&self, stage: Stage, work: F) -> Result<T, DeployError>
    where
        F: Future<Output = Result<T, StageError>>,
    {
        let cancel = self.poller.cancel_token();
        if cancel.is_cancelled() {
            self.reporter
                .warn(format!("cancelled before {stage} started"));
            return Err(DeployError::Cancelled { stage });
        }

        self.reporter.set_stage(Some(stage));
        self.tracker.lock().start(stage);
        info!(%stage, "stage started");
        self.reporter.info(format!("{stage} started"));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = work => Some(result),
        };

        let result = match outcome {
            Some(Ok(value)) => {
                self.tracker.lock().succeed(stage);
                info!(%stage, "stage succeeded");
                self.reporter.info(format!("{stage} succeeded"));
                Ok(value)
            }
            Some(Err(e)) if e.kind() != ErrorKind::Cancelled => {
                self.tracker.lock().fail(stage, e.to_string());
                warn!(%stage, error = %e, kind = %e.kind(), "stage failed");
                self.reporter.error(format!("{stage} failed: {e}"));
                Err(e).context(StageSnafu { stage })
            }
            Some(Err(_)) | None => {
                self.tracker.lock().fail(stage, "cancelled".to_string());
                self.reporter.warn(format!("{stage} cancelled"));
                Err(DeployError::Cancelled { stage })
            }
        };

        self.reporter.set_stage(None);
        result
    }
}

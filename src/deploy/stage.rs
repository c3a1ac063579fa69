// ABOUTME: Pipeline stage identifiers, their execution order, and per-run status tracking.
// ABOUTME: StageTracker records Pending/Running/Succeeded/Failed for every planned stage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the deployment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    EnableApis,
    EnsureBucket,
    PackageSource,
    UploadSource,
    EnsureRegistry,
    TriggerBuild,
    EnsureCluster,
    ApplyManifests,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::EnableApis => "enable-apis",
            Stage::EnsureBucket => "ensure-bucket",
            Stage::PackageSource => "package-source",
            Stage::UploadSource => "upload-source",
            Stage::EnsureRegistry => "ensure-registry",
            Stage::TriggerBuild => "trigger-build",
            Stage::EnsureCluster => "ensure-cluster",
            Stage::ApplyManifests => "apply-manifests",
        }
    }

    /// Stages in the order they run for the given cluster check placement.
    pub fn plan(cluster_check: ClusterCheck) -> [Stage; 8] {
        match cluster_check {
            ClusterCheck::BeforeApply => [
                Stage::EnableApis,
                Stage::EnsureBucket,
                Stage::PackageSource,
                Stage::UploadSource,
                Stage::EnsureRegistry,
                Stage::TriggerBuild,
                Stage::EnsureCluster,
                Stage::ApplyManifests,
            ],
            ClusterCheck::BeforeBuild => [
                Stage::EnableApis,
                Stage::EnsureBucket,
                Stage::PackageSource,
                Stage::UploadSource,
                Stage::EnsureRegistry,
                Stage::EnsureCluster,
                Stage::TriggerBuild,
                Stage::ApplyManifests,
            ],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the cluster existence check runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterCheck {
    /// After the build, right before descriptors are applied.
    #[default]
    BeforeApply,
    /// Before the build is submitted, so a missing cluster costs no build.
    BeforeBuild,
}

/// Progress of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Status of one stage within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub state: StageState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-run record of every planned stage.
#[derive(Debug, Clone, Default)]
pub struct StageTracker {
    results: Vec<StageResult>,
}

impl StageTracker {
    pub fn new(plan: &[Stage]) -> Self {
        Self {
            results: plan
                .iter()
                .map(|&stage| StageResult {
                    stage,
                    state: StageState::Pending,
                    error: None,
                })
                .collect(),
        }
    }

    pub(crate) fn start(&mut self, stage: Stage) {
        self.set(stage, StageState::Running, None);
    }

    pub(crate) fn succeed(&mut self, stage: Stage) {
        self.set(stage, StageState::Succeeded, None);
    }

    pub(crate) fn fail(&mut self, stage: Stage, error: String) {
        self.set(stage, StageState::Failed, Some(error));
    }

    fn set(&mut self, stage: Stage, state: StageState, error: Option<String>) {
        match self.results.iter_mut().find(|r| r.stage == stage) {
            Some(result) => {
                result.state = state;
                result.error = error;
            }
            None => self.results.push(StageResult {
                stage,
                state,
                error,
            }),
        }
    }

    pub fn get(&self, stage: Stage) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<StageResult> {
        self.results
    }
}

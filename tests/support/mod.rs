// ABOUTME: Test support utilities.
// ABOUTME: In-memory fake cloud with call recording, plus tracing setup.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use bytes::Bytes;
use hoist::cloud::{
    ApiOps, ApiState, BoxedOperation, BucketInfo, BuildOps, BuildOutcome, BuildRequest,
    CloudError, ClusterAccess, ClusterId, ClusterOps, CompletedOperation, Operation,
    OperationStatus, RegistryOps, RepositoryFormat, RepositoryInfo, SourceLocation, StorageOps,
};
use hoist::deploy::{DEFAULT_APIS, DeploymentRequest};
use hoist::manifest::Descriptor;
use hoist::package::SourceFile;
use hoist::types::ProjectId;
use parking_lot::Mutex;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("hoist=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const PROJECT: &str = "demo-project";
pub const REGION: &str = "us-central1";
pub const CLUSTER: &str = "main";
pub const BUCKET: &str = "demo-project-hoist-sources";
pub const REPOSITORY: &str = "hoist";
pub const ADDRESS: &str = "198.51.100.7";

pub fn project() -> ProjectId {
    ProjectId::new(PROJECT).unwrap()
}

pub fn cluster_id() -> ClusterId {
    ClusterId {
        project: project(),
        location: REGION.to_string(),
        name: CLUSTER.to_string(),
    }
}

/// Request for service `app` with a Dockerfile.
pub fn request() -> DeploymentRequest {
    DeploymentRequest::new(
        PROJECT,
        REGION,
        CLUSTER,
        "app",
        vec![
            SourceFile::inline("Dockerfile", "FROM python:3.12\nCOPY . .\n"),
            SourceFile::inline("main.py", "print('hello')\n"),
        ],
    )
    .unwrap()
}

/// Mutable state behind the fake. Tests tweak it through `FakeCloud::state`.
#[derive(Debug, Default)]
pub struct FakeState {
    pub enabled_apis: HashSet<String>,
    pub buckets: HashMap<String, BucketInfo>,
    pub repositories: HashMap<String, RepositoryInfo>,
    pub cluster_exists: bool,

    /// Address reported once `address_after_polls` queries returned nothing.
    pub address: Option<String>,
    pub address_after_polls: u32,
    pub address_polls: u32,

    /// Build reports pending this many times before finishing.
    pub build_pending_polls: u32,
    pub build_polls: u32,
    pub build_never_finishes: bool,
    pub build_failure: Option<String>,

    /// Create calls answer `AlreadyExists` even though reads said absent.
    pub lose_create_races: bool,

    /// Method name -> error returned by that method.
    pub failures: HashMap<&'static str, CloudError>,

    pub calls: Vec<&'static str>,
    pub uploads: Vec<(String, String, Bytes)>,
    pub builds: Vec<BuildRequest>,
    pub applied: Vec<(String, String)>,
}

/// In-memory stand-in for every cloud capability.
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloud {
    /// Nothing exists yet except the cluster, which hands out an address immediately.
    pub fn empty() -> Self {
        let cloud = Self::default();
        {
            let mut state = cloud.state.lock();
            state.cluster_exists = true;
            state.address = Some(ADDRESS.to_string());
        }
        cloud
    }

    /// Every prerequisite already in place.
    pub fn ready() -> Self {
        let cloud = Self::empty();
        {
            let mut state = cloud.state.lock();
            state.enabled_apis = DEFAULT_APIS.iter().map(|s| s.to_string()).collect();
            state.buckets.insert(
                BUCKET.to_string(),
                BucketInfo {
                    name: BUCKET.to_string(),
                    location: REGION.to_string(),
                },
            );
            state.repositories.insert(
                REPOSITORY.to_string(),
                RepositoryInfo {
                    name: REPOSITORY.to_string(),
                    url: format!("{REGION}-docker.pkg.dev/{PROJECT}/{REPOSITORY}"),
                },
            );
        }
        cloud
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, FakeState> {
        self.state.lock()
    }

    pub fn fail_on(&self, method: &'static str, error: CloudError) {
        self.state.lock().failures.insert(method, error);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == method).count()
    }

    fn record(&self, method: &'static str) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        state.calls.push(method);
        match state.failures.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ApiOps for FakeCloud {
    async fn api_state(&self, _project: &ProjectId, api: &str) -> Result<ApiState, CloudError> {
        self.record("api_state")?;
        Ok(if self.state.lock().enabled_apis.contains(api) {
            ApiState::Enabled
        } else {
            ApiState::Disabled
        })
    }

    async fn enable_api(
        &self,
        _project: &ProjectId,
        api: &str,
    ) -> Result<BoxedOperation<()>, CloudError> {
        self.record("enable_api")?;
        self.state.lock().enabled_apis.insert(api.to_string());
        Ok(CompletedOperation::boxed(format!("enable {api}"), ()))
    }
}

#[async_trait]
impl StorageOps for FakeCloud {
    async fn get_bucket(
        &self,
        _project: &ProjectId,
        name: &str,
    ) -> Result<Option<BucketInfo>, CloudError> {
        self.record("get_bucket")?;
        Ok(self.state.lock().buckets.get(name).cloned())
    }

    async fn create_bucket(
        &self,
        _project: &ProjectId,
        name: &str,
        location: &str,
    ) -> Result<BucketInfo, CloudError> {
        self.record("create_bucket")?;
        let mut state = self.state.lock();
        if state.lose_create_races {
            return Err(CloudError::AlreadyExists(format!("bucket {name}")));
        }
        let bucket = BucketInfo {
            name: name.to_string(),
            location: location.to_string(),
        };
        state.buckets.insert(name.to_string(), bucket.clone());
        Ok(bucket)
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<SourceLocation, CloudError> {
        self.record("upload_object")?;
        self.state
            .lock()
            .uploads
            .push((bucket.to_string(), key.to_string(), data));
        Ok(SourceLocation {
            bucket: bucket.to_string(),
            object: key.to_string(),
        })
    }
}

#[async_trait]
impl RegistryOps for FakeCloud {
    async fn get_repository(
        &self,
        _project: &ProjectId,
        _location: &str,
        name: &str,
    ) -> Result<Option<RepositoryInfo>, CloudError> {
        self.record("get_repository")?;
        Ok(self.state.lock().repositories.get(name).cloned())
    }

    async fn create_repository(
        &self,
        project: &ProjectId,
        location: &str,
        name: &str,
        _format: RepositoryFormat,
    ) -> Result<BoxedOperation<RepositoryInfo>, CloudError> {
        self.record("create_repository")?;
        let repository = RepositoryInfo {
            name: name.to_string(),
            url: format!("{location}-docker.pkg.dev/{project}/{name}"),
        };
        let mut state = self.state.lock();
        if state.lose_create_races {
            // Someone else created it first.
            state
                .repositories
                .insert(name.to_string(), repository.clone());
            return Err(CloudError::AlreadyExists(format!("repository {name}")));
        }
        state
            .repositories
            .insert(name.to_string(), repository.clone());
        Ok(CompletedOperation::boxed(
            format!("create repository {name}"),
            repository,
        ))
    }
}

struct FakeBuild {
    id: String,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl Operation for FakeBuild {
    type Output = BuildOutcome;

    fn name(&self) -> &str {
        &self.id
    }

    async fn status(&self) -> Result<OperationStatus<BuildOutcome>, CloudError> {
        let mut state = self.state.lock();
        state.calls.push("build_status");
        if let Some(error) = state.failures.get("build_status") {
            return Err(error.clone());
        }
        if let Some(ref message) = state.build_failure {
            return Ok(OperationStatus::Failed(message.clone()));
        }
        if state.build_never_finishes || state.build_polls < state.build_pending_polls {
            state.build_polls += 1;
            return Ok(OperationStatus::Pending);
        }
        Ok(OperationStatus::Done(BuildOutcome {
            build_id: self.id.clone(),
            image_digest: Some("sha256:feedface".to_string()),
        }))
    }
}

#[async_trait]
impl BuildOps for FakeCloud {
    async fn submit_build(
        &self,
        _project: &ProjectId,
        request: &BuildRequest,
    ) -> Result<BoxedOperation<BuildOutcome>, CloudError> {
        self.record("submit_build")?;
        self.state.lock().builds.push(request.clone());
        Ok(Box::new(FakeBuild {
            id: "build-1".to_string(),
            state: self.state.clone(),
        }))
    }
}

#[async_trait]
impl ClusterOps for FakeCloud {
    async fn cluster_exists(&self, _cluster: &ClusterId) -> Result<bool, CloudError> {
        self.record("cluster_exists")?;
        Ok(self.state.lock().cluster_exists)
    }

    async fn fetch_credentials(&self, cluster: &ClusterId) -> Result<ClusterAccess, CloudError> {
        self.record("fetch_credentials")?;
        Ok(ClusterAccess::new(cluster.clone()))
    }

    async fn apply_descriptor(
        &self,
        _access: &ClusterAccess,
        descriptor: &Descriptor,
    ) -> Result<(), CloudError> {
        self.record("apply_descriptor")?;
        self.state.lock().applied.push((
            descriptor.kind().as_str().to_string(),
            descriptor.to_yaml().unwrap(),
        ));
        Ok(())
    }

    async fn external_address(
        &self,
        _access: &ClusterAccess,
        _service: &str,
    ) -> Result<Option<String>, CloudError> {
        self.record("external_address")?;
        let mut state = self.state.lock();
        if state.address_polls < state.address_after_polls {
            state.address_polls += 1;
            return Ok(None);
        }
        Ok(state.address.clone())
    }
}

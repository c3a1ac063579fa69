// ABOUTME: Tests for ensure-exists provisioning against the fake cloud.
// ABOUTME: Idempotency, create races, read failures, and the cluster precondition.

mod support;

use std::sync::Arc;
use std::time::Duration;

use hoist::cloud::{CloudError, RepositoryFormat};
use hoist::error::ErrorKind;
use hoist::poll::{OperationPoller, PollSettings};
use hoist::progress::{NullSink, Reporter};
use hoist::provision::{ProvisionError, ProvisionSettings, Provisioner, ResourceSpec};
use hoist::types::ResourceKind;
use support::{BUCKET, FakeCloud, REGION, cluster_id, init_tracing, project};

fn provision_settings() -> ProvisionSettings {
    let wait = PollSettings::new(Duration::from_millis(200), Duration::from_millis(5));
    ProvisionSettings {
        api_enable: wait,
        repository: wait,
    }
}

fn bucket_spec() -> ResourceSpec {
    ResourceSpec::Bucket {
        project: project(),
        name: BUCKET.to_string(),
        location: REGION.to_string(),
    }
}

fn repository_spec() -> ResourceSpec {
    ResourceSpec::Repository {
        project: project(),
        name: "hoist".to_string(),
        location: REGION.to_string(),
        format: RepositoryFormat::Docker,
    }
}

struct Harness {
    cloud: FakeCloud,
    poller: OperationPoller,
    reporter: Reporter,
}

impl Harness {
    fn new(cloud: FakeCloud) -> Self {
        init_tracing();
        Self {
            cloud,
            poller: OperationPoller::default(),
            reporter: Reporter::new(Arc::new(NullSink)),
        }
    }

    fn provisioner(&self) -> Provisioner<'_, FakeCloud> {
        Provisioner::new(
            &self.cloud,
            &self.poller,
            &self.reporter,
            provision_settings(),
        )
    }
}

mod idempotency_tests {
    use super::*;

    #[tokio::test]
    async fn ensure_twice_creates_once_and_returns_same_ref() {
        let harness = Harness::new(FakeCloud::empty());
        let provisioner = harness.provisioner();

        let first = provisioner.ensure(&bucket_spec()).await.unwrap();
        let second = provisioner.ensure(&bucket_spec()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.kind(), ResourceKind::Bucket);
        assert_eq!(harness.cloud.count("create_bucket"), 1);
        assert_eq!(harness.cloud.count("get_bucket"), 2);
    }

    #[tokio::test]
    async fn enabled_api_is_left_alone() {
        let harness = Harness::new(FakeCloud::ready());
        let spec = ResourceSpec::Api {
            project: project(),
            name: "storage.googleapis.com".to_string(),
        };

        let reference = harness.provisioner().ensure(&spec).await.unwrap();

        assert_eq!(reference.id(), "storage.googleapis.com");
        assert_eq!(harness.cloud.count("enable_api"), 0);
    }

    #[tokio::test]
    async fn repository_ref_is_its_push_url() {
        let harness = Harness::new(FakeCloud::empty());
        let provisioner = harness.provisioner();

        let created = provisioner.ensure(&repository_spec()).await.unwrap();
        let existing = provisioner.ensure(&repository_spec()).await.unwrap();

        assert_eq!(created.id(), "us-central1-docker.pkg.dev/demo-project/hoist");
        assert_eq!(created, existing);
        assert_eq!(harness.cloud.count("create_repository"), 1);
    }
}

mod race_tests {
    use super::*;

    #[tokio::test]
    async fn bucket_created_concurrently_counts_as_success() {
        let cloud = FakeCloud::empty();
        cloud.state().lose_create_races = true;
        let harness = Harness::new(cloud);

        let reference = harness.provisioner().ensure(&bucket_spec()).await.unwrap();

        assert_eq!(reference.id(), BUCKET);
    }

    #[tokio::test]
    async fn repository_created_concurrently_is_reread() {
        let cloud = FakeCloud::empty();
        cloud.state().lose_create_races = true;
        let harness = Harness::new(cloud);

        let reference = harness
            .provisioner()
            .ensure(&repository_spec())
            .await
            .unwrap();

        assert_eq!(reference.kind(), ResourceKind::Repository);
        assert_eq!(harness.cloud.count("get_repository"), 2);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn read_failure_is_not_treated_as_absence() {
        let cloud = FakeCloud::empty();
        cloud.fail_on(
            "get_bucket",
            CloudError::Permanent("PERMISSION_DENIED: caller lacks storage.buckets.get".into()),
        );
        let harness = Harness::new(cloud);

        let err = harness.provisioner().ensure(&bucket_spec()).await.unwrap_err();

        assert!(matches!(err, ProvisionError::ReadState { .. }));
        assert_eq!(err.kind(), ErrorKind::PermanentRemote);
        assert_eq!(harness.cloud.count("create_bucket"), 0);
    }

    #[tokio::test]
    async fn create_failure_keeps_remote_kind() {
        let cloud = FakeCloud::empty();
        cloud.fail_on("create_bucket", CloudError::Transient("503".into()));
        let harness = Harness::new(cloud);

        let err = harness.provisioner().ensure(&bucket_spec()).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Create { .. }));
        assert_eq!(err.kind(), ErrorKind::TransientRemote);
        assert!(err.to_string().contains(BUCKET));
    }

    #[tokio::test]
    async fn api_enable_failure_is_reported() {
        let cloud = FakeCloud::empty();
        cloud.fail_on("enable_api", CloudError::Permanent("billing disabled".into()));
        let harness = Harness::new(cloud);
        let spec = ResourceSpec::Api {
            project: project(),
            name: "container.googleapis.com".to_string(),
        };

        let err = harness.provisioner().ensure(&spec).await.unwrap_err();

        assert!(err.to_string().contains("container.googleapis.com"));
        assert_eq!(err.kind(), ErrorKind::PermanentRemote);
    }
}

mod cluster_tests {
    use super::*;

    #[tokio::test]
    async fn existing_cluster_is_confirmed() {
        let harness = Harness::new(FakeCloud::ready());

        let confirmed = harness
            .provisioner()
            .ensure_cluster(&cluster_id())
            .await
            .unwrap();

        assert_eq!(confirmed.cluster(), &cluster_id());
    }

    #[tokio::test]
    async fn missing_cluster_is_a_precondition_failure() {
        let cloud = FakeCloud::ready();
        cloud.state().cluster_exists = false;
        let harness = Harness::new(cloud);

        let err = harness
            .provisioner()
            .ensure(&ResourceSpec::Cluster(cluster_id()))
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::ClusterMissing { .. }));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("main"));
    }

    #[tokio::test]
    async fn not_found_from_lookup_means_absent() {
        let cloud = FakeCloud::ready();
        cloud.fail_on("cluster_exists", CloudError::NotFound("cluster main".into()));
        let harness = Harness::new(cloud);

        let exists = harness
            .provisioner()
            .cluster_exists(&cluster_id())
            .await
            .unwrap();

        assert!(!exists);
    }

    #[tokio::test]
    async fn unreachable_control_plane_is_not_absence() {
        let cloud = FakeCloud::ready();
        cloud.fail_on("cluster_exists", CloudError::Transient("timeout".into()));
        let harness = Harness::new(cloud);

        let err = harness
            .provisioner()
            .ensure_cluster(&cluster_id())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::ReadState { .. }));
        assert_eq!(err.kind(), ErrorKind::TransientRemote);
    }
}

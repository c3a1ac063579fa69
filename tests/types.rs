// ABOUTME: Integration tests for validated domain types.
// ABOUTME: Tests parsing, validation, and image target derivation.

use hoist::types::*;
use proptest::prelude::*;

mod image_ref_tests {
    use super::*;

    #[test]
    fn parse_simple_name() {
        let img = ImageRef::parse("nginx").unwrap();
        assert_eq!(img.name(), "nginx");
        assert_eq!(img.tag(), Some("latest"));
        assert!(img.registry().is_none());
        assert!(img.digest().is_none());
    }

    #[test]
    fn parse_regional_registry() {
        let img = ImageRef::parse("us-central1-docker.pkg.dev/demo/hoist/web:v2").unwrap();
        assert_eq!(img.registry(), Some("us-central1-docker.pkg.dev"));
        assert_eq!(img.name(), "demo/hoist/web");
        assert_eq!(img.tag(), Some("v2"));
    }

    #[test]
    fn parse_registry_with_port() {
        let img = ImageRef::parse("localhost:5000/app").unwrap();
        assert_eq!(img.registry(), Some("localhost:5000"));
        assert_eq!(img.name(), "app");
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn parse_with_digest() {
        let img = ImageRef::parse("nginx@sha256:abc123def456").unwrap();
        assert_eq!(img.digest(), Some("sha256:abc123def456"));
        assert!(img.tag().is_none());
    }

    #[test]
    fn parse_empty_returns_error() {
        assert!(matches!(ImageRef::parse("  "), Err(ParseImageRefError::Empty)));
    }

    #[test]
    fn parse_invalid_chars_returns_error() {
        assert!(matches!(
            ImageRef::parse("invalid image!"),
            Err(ParseImageRefError::InvalidChar(' '))
        ));
    }

    #[test]
    fn service_target_uses_regional_repository() {
        let project = ProjectId::new("demo-project").unwrap();
        let service = ServiceName::new("web").unwrap();

        let img = ImageRef::for_service("europe-west4", &project, "hoist", &service);

        assert_eq!(
            img.to_string(),
            "europe-west4-docker.pkg.dev/demo-project/hoist/web:latest"
        );
    }

    #[test]
    fn target_follows_repository_push_prefix() {
        let service = ServiceName::new("web").unwrap();

        let img = ImageRef::in_repository("europe-docker.pkg.dev/demo-project/hoist/", &service)
            .unwrap();

        assert_eq!(img.registry(), Some("europe-docker.pkg.dev"));
        assert_eq!(img.name(), "demo-project/hoist/web");
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn malformed_repository_prefix_is_rejected() {
        let service = ServiceName::new("web").unwrap();
        assert!(ImageRef::in_repository("bad repo", &service).is_err());
    }

    #[test]
    fn digest_pins_without_losing_tag() {
        let img = ImageRef::parse("gcr.io/demo/web:latest").unwrap();

        let pinned = img.with_digest("sha256:feed");

        assert_eq!(pinned.to_string(), "gcr.io/demo/web:latest@sha256:feed");
        assert_eq!(img.digest(), None);
    }
}

mod service_name_tests {
    use super::*;

    #[test]
    fn valid_dns_name() {
        let name = ServiceName::new("my-service").unwrap();
        assert_eq!(name.as_str(), "my-service");
    }

    #[test]
    fn empty_returns_error() {
        assert_eq!(ServiceName::new(""), Err(ServiceNameError::Empty));
    }

    #[test]
    fn too_long_returns_error() {
        assert_eq!(
            ServiceName::new(&"a".repeat(64)),
            Err(ServiceNameError::TooLong)
        );
        assert!(ServiceName::new(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn hyphen_edges_return_error() {
        assert!(ServiceName::new("-service").is_err());
        assert!(ServiceName::new("service-").is_err());
    }

    #[test]
    fn uppercase_and_underscores_return_error() {
        assert_eq!(
            ServiceName::new("MyService"),
            Err(ServiceNameError::NotLowercase)
        );
        assert_eq!(
            ServiceName::new("my_service"),
            Err(ServiceNameError::InvalidChar('_'))
        );
    }

    #[test]
    fn source_key_is_namespaced_by_service() {
        let name = ServiceName::new("web").unwrap();
        assert_eq!(name.source_object_key(), "web/source.tar.gz");
    }
}

mod project_id_tests {
    use super::*;

    #[test]
    fn valid_project() {
        let id = ProjectId::new("demo-project-42").unwrap();
        assert_eq!(id.as_str(), "demo-project-42");
        assert_eq!(id.to_string(), "demo-project-42");
    }

    #[test]
    fn length_bounds() {
        assert_eq!(ProjectId::new("short"), Err(ProjectIdError::BadLength(5)));
        assert!(ProjectId::new("sixsix").is_ok());
        assert!(ProjectId::new(&"a".repeat(30)).is_ok());
        assert!(ProjectId::new(&"a".repeat(31)).is_err());
    }

    #[test]
    fn must_start_with_letter() {
        assert_eq!(
            ProjectId::new("1project"),
            Err(ProjectIdError::BadStart)
        );
    }

    #[test]
    fn trailing_hyphen_returns_error() {
        assert_eq!(
            ProjectId::new("project-"),
            Err(ProjectIdError::EndsWithHyphen)
        );
    }

    #[test]
    fn empty_returns_error() {
        assert_eq!(ProjectId::new(""), Err(ProjectIdError::Empty));
    }
}

mod resource_ref_tests {
    use super::*;

    #[test]
    fn kind_and_id_round_out_display() {
        let reference = ResourceRef::new(ResourceKind::Bucket, "demo-sources");
        assert_eq!(reference.kind(), ResourceKind::Bucket);
        assert_eq!(reference.id(), "demo-sources");
        assert!(reference.to_string().contains("demo-sources"));
    }
}

proptest! {
    #[test]
    fn generated_service_names_are_accepted(name in "[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?") {
        prop_assert!(ServiceName::new(&name).is_ok());
    }

    #[test]
    fn service_target_always_parses_back(
        region in "[a-z]{2,8}-[a-z]{4,9}[0-9]",
        service in "[a-z][a-z0-9]{0,20}",
    ) {
        let project = ProjectId::new("demo-project").unwrap();
        let service = ServiceName::new(&service).unwrap();

        let img = ImageRef::for_service(&region, &project, "hoist", &service);
        let reparsed = ImageRef::parse(&img.to_string()).unwrap();

        prop_assert_eq!(reparsed, img);
    }
}

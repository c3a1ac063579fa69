// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates hoist.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ProjectId, ServiceName};

use super::CONFIG_FILENAME;

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    project: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let service = match service {
        Some(s) => ServiceName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => ServiceName::new("my-app").map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };
    let project = match project {
        Some(p) => ProjectId::new(p)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?
            .to_string(),
        None => "my-project".to_string(),
    };

    let yaml = generate_template_yaml(&service, &project);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(service: &ServiceName, project: &str) -> String {
    format!(
        r#"service: {service}
project: {project}
region: us-central1
# Pre-existing cluster; hoist never creates clusters.
cluster: my-cluster

# Directory packaged and built. A Dockerfile at its root selects a docker build,
# otherwise buildpacks are used.
source: .

# replicas: 1
# container_port: 8080
# cluster_check: before-apply   # or before-build

# timeouts:
#   build: 20m
#   address: 10m

# destinations:
#   staging:
#     project: my-project-staging
#     cluster: {{ env: STAGING_CLUSTER, default: staging }}
"#
    )
}

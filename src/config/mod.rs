// ABOUTME: Configuration types and parsing for hoist.yml.
// ABOUTME: Handles YAML parsing, env var references, destination merging, and pipeline settings.

mod deserialize;
mod env_value;
mod init;
mod timeouts;

pub use env_value::EnvValue;
pub use init::init_config;
pub use timeouts::TimeoutsConfig;

use crate::build::BuildSettings;
use crate::deploy::{
    ClusterCheck, DEFAULT_APIS, DEFAULT_REPOSITORY, DeploymentRequest, Settings,
};
use crate::error::{Error, Result};
use crate::manifest::ManifestSettings;
use crate::package::SourceFile;
use crate::types::ServiceName;
use deserialize::{deserialize_apis, deserialize_service_name};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "hoist.yml";
pub const CONFIG_FILENAME_ALT: &str = "hoist.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hoist/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project: EnvValue,

    pub region: EnvValue,

    pub cluster: EnvValue,

    #[serde(deserialize_with = "deserialize_service_name")]
    pub service: ServiceName,

    /// Directory packaged as the build context, relative to the config's directory.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default = "default_repository")]
    pub repository: String,

    #[serde(default = "default_apis", deserialize_with = "deserialize_apis")]
    pub apis: Vec<String>,

    #[serde(default = "default_replicas")]
    pub replicas: u32,

    #[serde(default = "default_container_port")]
    pub container_port: u16,

    #[serde(default)]
    pub cluster_check: ClusterCheck,

    #[serde(default)]
    pub buildpacks_builder: Option<String>,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

/// Per-environment overrides selected with `--destination`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default)]
    pub project: Option<EnvValue>,

    #[serde(default)]
    pub region: Option<EnvValue>,

    #[serde(default)]
    pub cluster: Option<EnvValue>,

    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub replicas: Option<u32>,
}

fn default_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_repository() -> String {
    DEFAULT_REPOSITORY.to_string()
}

fn default_apis() -> Vec<String> {
    DEFAULT_APIS.iter().map(|s| s.to_string()).collect()
}

fn default_replicas() -> u32 {
    1
}

fn default_container_port() -> u16 {
    8080
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref project) = dest.project {
            merged.project = project.clone();
        }
        if let Some(ref region) = dest.region {
            merged.region = region.clone();
        }
        if let Some(ref cluster) = dest.cluster {
            merged.cluster = cluster.clone();
        }
        if dest.bucket.is_some() {
            merged.bucket = dest.bucket.clone();
        }
        if let Some(replicas) = dest.replicas {
            merged.replicas = replicas;
        }

        Ok(merged)
    }

    /// Pipeline settings derived from this config.
    pub fn settings(&self) -> Settings {
        let mut build = BuildSettings {
            timeout: self.timeouts.build,
            ..BuildSettings::default()
        };
        if let Some(ref builder) = self.buildpacks_builder {
            build.buildpacks_builder = builder.clone();
        }

        Settings {
            apis: self.apis.clone(),
            bucket: self.bucket.clone(),
            repository: self.repository.clone(),
            manifest: ManifestSettings {
                replicas: self.replicas,
                container_port: self.container_port,
            },
            build,
            cluster_check: self.cluster_check,
            timeouts: self.timeouts.to_timeouts(),
        }
    }

    /// Resolve env references and validate a request for `files`.
    pub fn request(&self, files: Vec<SourceFile>) -> Result<DeploymentRequest> {
        let project = self.project.resolve()?;
        let region = self.region.resolve()?;
        let cluster = self.cluster.resolve()?;
        Ok(DeploymentRequest::new(
            &project,
            &region,
            &cluster,
            self.service.as_str(),
            files,
        )?)
    }

    /// Source directory resolved against the directory holding the config.
    pub fn source_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.source)
    }
}

// ABOUTME: Workload and network-exposure descriptors for a deployed service.
// ABOUTME: Pure and deterministic so re-applying identical input changes nothing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ImageRef, ServiceName};

/// Label marking objects as managed by this tool.
pub const CREATED_BY_LABEL: &str = "created-by";
pub const CREATED_BY_VALUE: &str = "hoist";

/// Port the load balancer listens on.
pub const SERVICE_PORT: u16 = 80;

/// Workload shape shared by every generated deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestSettings {
    pub replicas: u32,
    pub container_port: u16,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            replicas: 1,
            container_port: 8080,
        }
    }
}

/// Which object a descriptor declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Deployment,
    Service,
}

impl DescriptorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::Deployment => "Deployment",
            DescriptorKind::Service => "Service",
        }
    }
}

/// Declarative desired state of one cluster object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum Body {
    Deployment(DeploymentDoc),
    Service(ServiceDoc),
}

impl Descriptor {
    pub fn kind(&self) -> DescriptorKind {
        match self.body {
            Body::Deployment(_) => DescriptorKind::Deployment,
            Body::Service(_) => DescriptorKind::Service,
        }
    }

    /// Object name inside the cluster.
    pub fn name(&self) -> &str {
        match &self.body {
            Body::Deployment(doc) => &doc.metadata.name,
            Body::Service(doc) => &doc.metadata.name,
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.body)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.body)
    }
}

/// The two descriptors deployed for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifests {
    pub deployment: Descriptor,
    pub service: Descriptor,
}

/// Produces descriptors from a service name and image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestGenerator {
    settings: ManifestSettings,
}

impl ManifestGenerator {
    pub fn new(settings: ManifestSettings) -> Self {
        Self { settings }
    }

    pub fn generate(&self, service: &ServiceName, image: &ImageRef) -> Manifests {
        let name = service.to_string();
        let labels = labels(service);
        let selector = BTreeMap::from([("app".to_string(), name.clone())]);

        let deployment = DeploymentDoc {
            api_version: "apps/v1",
            kind: "Deployment",
            metadata: Metadata {
                name: name.clone(),
                labels: labels.clone(),
            },
            spec: DeploymentSpec {
                replicas: self.settings.replicas,
                selector: Selector {
                    match_labels: selector.clone(),
                },
                template: PodTemplate {
                    metadata: TemplateMetadata {
                        labels: labels.clone(),
                    },
                    spec: PodSpec {
                        containers: vec![Container {
                            name: name.clone(),
                            image: image.to_string(),
                            ports: vec![ContainerPort {
                                container_port: self.settings.container_port,
                            }],
                        }],
                    },
                },
            },
        };

        let service = ServiceDoc {
            api_version: "v1",
            kind: "Service",
            metadata: Metadata { name, labels },
            spec: ServiceSpec {
                service_type: "LoadBalancer",
                selector,
                ports: vec![ServicePort {
                    port: SERVICE_PORT,
                    target_port: self.settings.container_port,
                    protocol: "TCP",
                }],
            },
        };

        Manifests {
            deployment: Descriptor {
                body: Body::Deployment(deployment),
            },
            service: Descriptor {
                body: Body::Service(service),
            },
        }
    }
}

fn labels(service: &ServiceName) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), service.to_string()),
        (CREATED_BY_LABEL.to_string(), CREATED_BY_VALUE.to_string()),
    ])
}

// Document shapes. Field order is serialization order.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentDoc {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    spec: DeploymentSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Metadata {
    name: String,
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DeploymentSpec {
    replicas: u32,
    selector: Selector,
    template: PodTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
    match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct PodTemplate {
    metadata: TemplateMetadata,
    spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct TemplateMetadata {
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct PodSpec {
    containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Container {
    name: String,
    image: String,
    ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerPort {
    container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDoc {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    spec: ServiceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ServiceSpec {
    #[serde(rename = "type")]
    service_type: &'static str,
    selector: BTreeMap<String, String>,
    ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    port: u16,
    target_port: u16,
    protocol: &'static str,
}

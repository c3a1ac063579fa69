// ABOUTME: Validated domain types for deployment targets.
// ABOUTME: Service names, project ids, image references, and resource references.

mod image_ref;
mod project_id;
mod resource_ref;
mod service_name;

pub use image_ref::{DEFAULT_TAG, ImageRef, ParseImageRefError};
pub use project_id::{ProjectId, ProjectIdError};
pub use resource_ref::{ResourceKind, ResourceRef};
pub use service_name::{ServiceName, ServiceNameError};

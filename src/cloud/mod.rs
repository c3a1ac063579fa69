// ABOUTME: Outbound cloud capabilities used by the pipeline.
// ABOUTME: Capability traits, operation handles, errors, and the gcloud/kubectl adapter.

mod error;
mod gcloud;
mod operation;
pub mod traits;

pub use error::CloudError;
pub use gcloud::GcloudCli;
pub use operation::{BoxedOperation, CompletedOperation, Operation, OperationStatus};
pub use traits::*;

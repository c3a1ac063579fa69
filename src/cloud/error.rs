// ABOUTME: Error type shared by every cloud capability.
// ABOUTME: Separates transient, permanent, not-found, and conflict failures.

use crate::error::ErrorKind;

/// Failure reported by a remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloudError {
    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A create call conflicted with an existing resource.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Permission, quota, or invalid-argument failure.
    #[error("permanent remote error: {0}")]
    Permanent(String),

    /// Network or server-side failure.
    #[error("transient remote error: {0}")]
    Transient(String),
}

impl CloudError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudError::NotFound(_) => ErrorKind::NotFound,
            CloudError::AlreadyExists(_) | CloudError::Permanent(_) => ErrorKind::PermanentRemote,
            CloudError::Transient(_) => ErrorKind::TransientRemote,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CloudError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

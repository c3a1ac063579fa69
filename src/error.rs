// ABOUTME: Application-wide error types and the shared error taxonomy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::{DeployError, ValidationError};
use crate::package::PackageError;

/// Error classes shared by every pipeline component.
///
/// Each component error exposes `kind()` so callers can decide between
/// retrying, fixing input, or fixing the environment without matching on
/// component-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request, rejected before any remote call.
    Validation,
    /// Network or server-side failure; safe to retry at a higher layer.
    TransientRemote,
    /// Permission, quota, or bad-argument failure; retrying will not help.
    PermanentRemote,
    /// A resource that was required to exist is absent.
    NotFound,
    /// A pipeline invariant does not hold (e.g. missing target cluster).
    Precondition,
    /// A poll loop exceeded its deadline.
    Timeout,
    /// The caller aborted the run.
    Cancelled,
    /// Local I/O failure unrelated to the request's content.
    Local,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::TransientRemote => "transient remote",
            ErrorKind::PermanentRemote => "permanent remote",
            ErrorKind::NotFound => "not found",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Local => "local",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("environment variable not set: {0}")]
    MissingEnvVar(String),

    #[error("invalid deployment request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("failed to collect source files: {0}")]
    Source(#[from] PackageError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

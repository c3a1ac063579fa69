// ABOUTME: Generic rollout struct parameterized by state.
// ABOUTME: State types carry stage outputs so later stages cannot run without them.

use crate::types::{ImageRef, ProjectId, ServiceName};

use super::request::DeploymentRequest;
use super::state::{Deployed, ImageBuilt, Prepared, RegistryReady};

/// A deployment run in progress, parameterized by its current state.
///
/// The state type parameter `S` carries the outputs of completed stages
/// (bucket, uploaded source, image), so the stage order is enforced at
/// compile time.
#[derive(Debug)]
pub struct Rollout<S> {
    pub(crate) request: DeploymentRequest,
    pub(crate) state: S,
}

impl Rollout<Prepared> {
    pub fn new(request: DeploymentRequest) -> Self {
        Rollout {
            request,
            state: Prepared,
        }
    }
}

impl<S> Rollout<S> {
    pub fn request(&self) -> &DeploymentRequest {
        &self.request
    }

    pub fn project(&self) -> &ProjectId {
        self.request.project()
    }

    pub fn service_name(&self) -> &ServiceName {
        self.request.service()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Move to the next state, keeping the request.
    pub(crate) fn advance<T>(self, state: T) -> Rollout<T> {
        Rollout {
            request: self.request,
            state,
        }
    }
}

impl Rollout<RegistryReady> {
    pub fn target(&self) -> &ImageRef {
        self.state.target()
    }
}

impl Rollout<ImageBuilt> {
    pub fn image(&self) -> &ImageRef {
        self.state.image()
    }
}

impl Rollout<Deployed> {
    pub fn url(&self) -> &str {
        self.state.url()
    }
}

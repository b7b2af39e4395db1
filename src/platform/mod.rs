//! Platform module - trait seams over the managed training/hosting
//! platform and the object store.
//!
//! Every external collaborator is behind a trait so the lifecycle manager
//! and the predict path can be exercised against mocks. The concrete
//! implementations are thin wrappers over the AWS SDK clients.

pub mod hosting;
pub mod images;
pub mod runtime;
pub mod store;

pub use hosting::{
    EndpointStatus, HostingPlatform, ModelBinding, ResourceState, SageMakerPlatform,
    TrainingSpec, TrainingStatus,
};
pub use runtime::{EndpointInvoker, SageMakerInvoker};
pub use store::{ObjectStore, S3Store};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// Any platform or store failure other than not-found. The upstream
    /// message is carried verbatim.
    #[error("{0}")]
    Platform(String),

    /// A blocking wait outlived its caller-supplied deadline.
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),

    /// A resource name that cannot participate in the naming rule.
    #[error("invalid resource name: {0}")]
    InvalidName(String),

    /// The platform returned a body the caller cannot interpret.
    #[error("malformed platform response: {0}")]
    MalformedResponse(String),
}

//! Capability boundary over the container runtime.
//!
//! The core only ever talks to [`RuntimeClient`]; the Docker backend lives in its own crate and tests run
//! against an in-memory fake.

mod context;
pub use context::CallContext;

mod error;
pub use error::RuntimeError;

mod types;
pub use types::{
    ContainerFilter, ContainerSpec, ContainerSummary, ImageFilter, ImageRef, ImageSummary,
    LogsRequest, RemoveOptions,
};

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use yuki_model::ContainerId;

/// Container and image operations the core needs from a runtime.
///
/// Implementations must honour the [`CallContext`] of every call: return [`RuntimeError::Cancelled`] once
/// it is cancelled and [`RuntimeError::DeadlineExceeded`] once its deadline passes.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Create (but do not start) a container.
    ///
    /// Fails with [`RuntimeError::ImageNotFound`] when the image is not present locally and with
    /// [`RuntimeError::Conflict`] when the name is taken.
    async fn create_container(
        &self,
        ctx: &CallContext,
        spec: &ContainerSpec,
    ) -> Result<ContainerId, RuntimeError>;

    async fn start_container(&self, ctx: &CallContext, id: &str) -> Result<(), RuntimeError>;

    /// Ask the container to stop, killing it after `grace`.
    async fn stop_container(
        &self,
        ctx: &CallContext,
        id: &str,
        grace: Duration,
    ) -> Result<(), RuntimeError>;

    async fn remove_container(
        &self,
        ctx: &CallContext,
        id: &str,
        opts: RemoveOptions,
    ) -> Result<(), RuntimeError>;

    async fn list_containers(
        &self,
        ctx: &CallContext,
        filter: &ContainerFilter,
    ) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Block until the container exits and return its exit code.
    async fn wait_container(&self, ctx: &CallContext, id: &str) -> Result<i64, RuntimeError>;

    /// Copy the container's output into `sink` until the stream ends or the context stops it.
    async fn logs(
        &self,
        ctx: &CallContext,
        id: &str,
        req: &LogsRequest,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), RuntimeError>;

    async fn pull_image(&self, ctx: &CallContext, image: &str) -> Result<(), RuntimeError>;

    async fn remove_image(&self, ctx: &CallContext, id: &str) -> Result<(), RuntimeError>;

    async fn list_images(
        &self,
        ctx: &CallContext,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageSummary>, RuntimeError>;
}

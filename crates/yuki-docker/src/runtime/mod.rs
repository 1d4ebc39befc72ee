mod convert;

use std::time::Duration;

use async_trait::async_trait;
use bollard::{
    API_DEFAULT_VERSION, Docker,
    errors::Error as BollardError,
    query_parameters::{
        CreateContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptionsBuilder,
        LogsOptionsBuilder, RemoveContainerOptionsBuilder,
        RemoveImageOptions, StartContainerOptions, StopContainerOptionsBuilder, WaitContainerOptions,
    },
};
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, trace};
use yuki_core::runtime::{
    CallContext, ContainerFilter, ContainerSpec, ContainerSummary, ImageFilter, ImageRef,
    ImageSummary, LogsRequest, RemoveOptions, RuntimeClient, RuntimeError,
};
use yuki_model::ContainerId;

use crate::{
    config::{DockerConfig, DockerEndpoint},
    error::DockerError,
};

use convert::classify;

/// [`RuntimeClient`] talking to a Docker daemon.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
    endpoint: DockerEndpoint,
    pull_inactivity: Duration,
}

impl DockerRuntime {
    /// Connect to the daemon described by `cfg`. No request is made yet.
    pub fn connect(cfg: &DockerConfig) -> Result<Self, DockerError> {
        let endpoint = cfg.endpoint();
        let docker = match &endpoint {
            DockerEndpoint::Local => Docker::connect_with_local_defaults(),
            DockerEndpoint::Unix(path) => {
                Docker::connect_with_socket(&path.to_string_lossy(), cfg.timeout_secs, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| DockerError::Connect {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            docker,
            endpoint,
            pull_inactivity: cfg.pull_inactivity(),
        })
    }

    /// Check that the daemon answers.
    pub async fn ping(&self) -> Result<(), DockerError> {
        self.docker
            .ping()
            .await
            .map_err(|e| DockerError::Unreachable {
                endpoint: self.endpoint.to_string(),
                reason: e.to_string(),
            })?;
        info!(endpoint = %self.endpoint, "docker daemon reachable");
        Ok(())
    }

    async fn drain_pull(&self, image: &str) -> Result<(), RuntimeError> {
        let image_ref = ImageRef::parse(image);
        let opts = CreateImageOptionsBuilder::new()
            .from_image(&image_ref.repository)
            .tag(image_ref.tag_or_latest())
            .build();

        let stream = self.docker.create_image(Some(opts), None, None);
        tokio::pin!(stream);
        loop {
            match tokio::time::timeout(self.pull_inactivity, stream.next()).await {
                Ok(Some(Ok(progress))) => {
                    trace!(image, status = progress.status.as_deref().unwrap_or(""), "pull progress")
                }
                Ok(Some(Err(e))) => return Err(classify(e, None)),
                Ok(None) => return Ok(()),
                Err(_) => {
                    return Err(RuntimeError::Api(format!(
                        "pull of {image} stalled for {:?}",
                        self.pull_inactivity
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    fn name(&self) -> &'static str {
        "docker"
    }

    #[instrument(level = "debug", skip(self, ctx, spec), fields(name = %spec.name, image = %spec.image))]
    async fn create_container(
        &self,
        ctx: &CallContext,
        spec: &ContainerSpec,
    ) -> Result<ContainerId, RuntimeError> {
        let opts = CreateContainerOptionsBuilder::new().name(&spec.name).build();
        let body = convert::create_body(spec);

        let created = ctx
            .run(async {
                self.docker
                    .create_container(Some(opts), body)
                    .await
                    .map_err(|e| classify(e, Some(spec.image.as_str())))
            })
            .await?;
        for warning in &created.warnings {
            debug!(id = %created.id, warning, "docker create warning");
        }
        Ok(created.id)
    }

    async fn start_container(&self, ctx: &CallContext, id: &str) -> Result<(), RuntimeError> {
        ctx.run(async {
            self.docker
                .start_container(id, None::<StartContainerOptions>)
                .await
                .map_err(|e| classify(e, None))
        })
        .await
    }

    async fn stop_container(
        &self,
        ctx: &CallContext,
        id: &str,
        grace: Duration,
    ) -> Result<(), RuntimeError> {
        let secs = i32::try_from(grace.as_secs()).unwrap_or(i32::MAX);
        let opts = StopContainerOptionsBuilder::new().t(secs).build();
        ctx.run(async {
            self.docker
                .stop_container(id, Some(opts))
                .await
                .map_err(|e| classify(e, None))
        })
        .await
    }

    async fn remove_container(
        &self,
        ctx: &CallContext,
        id: &str,
        opts: RemoveOptions,
    ) -> Result<(), RuntimeError> {
        let opts = RemoveContainerOptionsBuilder::new()
            .force(opts.force)
            .v(opts.volumes)
            .build();
        ctx.run(async {
            self.docker
                .remove_container(id, Some(opts))
                .await
                .map_err(|e| classify(e, None))
        })
        .await
    }

    async fn list_containers(
        &self,
        ctx: &CallContext,
        filter: &ContainerFilter,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let opts = ListContainersOptionsBuilder::new()
            .all(true)
            .filters(&convert::container_filters(filter))
            .build();
        let raw = ctx
            .run(async {
                self.docker
                    .list_containers(Some(opts))
                    .await
                    .map_err(|e| classify(e, None))
            })
            .await?;
        Ok(raw.into_iter().filter_map(convert::container_summary).collect())
    }

    async fn wait_container(&self, ctx: &CallContext, id: &str) -> Result<i64, RuntimeError> {
        ctx.run(async {
            let stream = self.docker.wait_container(id, None::<WaitContainerOptions>);
            tokio::pin!(stream);
            match stream.next().await {
                Some(Ok(resp)) => Ok(resp.status_code),
                // A non-zero exit is reported as an error item.
                Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
                Some(Err(e)) => Err(classify(e, None)),
                None => Err(RuntimeError::Api(format!("wait stream of {id} ended without a status"))),
            }
        })
        .await
    }

    async fn logs(
        &self,
        ctx: &CallContext,
        id: &str,
        req: &LogsRequest,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), RuntimeError> {
        let opts = LogsOptionsBuilder::new()
            .stdout(req.stdout)
            .stderr(req.stderr)
            .follow(req.follow)
            .tail(&req.tail)
            .build();

        ctx.run(async {
            let stream = self.docker.logs(id, Some(opts));
            tokio::pin!(stream);
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| classify(e, None))?;
                sink.write_all(&chunk.into_bytes()).await?;
            }
            sink.flush().await?;
            Ok::<(), RuntimeError>(())
        })
        .await
    }

    #[instrument(level = "info", skip(self, ctx))]
    async fn pull_image(&self, ctx: &CallContext, image: &str) -> Result<(), RuntimeError> {
        ctx.run(self.drain_pull(image)).await?;
        info!(image, "image pulled");
        Ok(())
    }

    async fn remove_image(&self, ctx: &CallContext, id: &str) -> Result<(), RuntimeError> {
        ctx.run(async {
            self.docker
                .remove_image(id, None::<RemoveImageOptions>, None)
                .await
                .map(|_| ())
                .map_err(|e| classify(e, None))
        })
        .await
    }

    async fn list_images(
        &self,
        ctx: &CallContext,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageSummary>, RuntimeError> {
        let opts = convert::list_images_options(filter);
        let raw = ctx
            .run(async {
                self.docker
                    .list_images(Some(opts))
                    .await
                    .map_err(|e| classify(e, None))
            })
            .await?;
        Ok(raw.into_iter().map(convert::image_summary).collect())
    }
}

//! Fleet sweeper: best-effort bulk maintenance of images and sync containers.
//!
//! Sweeps never fail. A failed listing aborts the sweep and per-item errors are skipped; both are logged
//! and recorded in the returned [`SweepReport`].

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, error, info, instrument, warn};
use yuki_model::{Container, ContainerStatus, LABEL_IMAGES, LABEL_SYNCING};

use crate::{
    config::CoreConfig,
    group::TaskGroup,
    runtime::{CallContext, ContainerFilter, ImageFilter, RemoveOptions, RuntimeClient},
    store::RepositoryStore,
    waiter::Waiter,
};

/// A single item a sweep could not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub item: String,
    pub error: String,
}

/// Outcome of one sweep, for observation only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Items the sweep acted on.
    pub attempted: usize,
    pub failed: Vec<SweepFailure>,
    /// Reason the sweep stopped before acting on anything.
    pub aborted: Option<String>,
    /// Concurrent members that panicked.
    pub lost: usize,
}

impl SweepReport {
    fn abort(reason: impl fmt::Display) -> Self {
        Self {
            aborted: Some(reason.to_string()),
            ..Default::default()
        }
    }

    fn fail(&mut self, item: impl Into<String>, error: impl fmt::Display) {
        self.failed.push(SweepFailure {
            item: item.into(),
            error: error.to_string(),
        });
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed.len() - self.lost
    }

    /// Nothing aborted and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.failed.is_empty() && self.lost == 0
    }
}

#[derive(Clone)]
pub struct Sweeper {
    runtime: Arc<dyn RuntimeClient>,
    store: Arc<dyn RepositoryStore>,
    waiter: Waiter,
    sweep_timeout: Duration,
    remove_timeout: Duration,
    max_concurrent_pulls: usize,
    root: CallContext,
}

impl Sweeper {
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        store: Arc<dyn RepositoryStore>,
        waiter: Waiter,
        config: &CoreConfig,
        root: CallContext,
    ) -> Self {
        Self {
            runtime,
            store,
            waiter,
            sweep_timeout: config.sweep_timeout(),
            remove_timeout: config.remove_timeout(),
            max_concurrent_pulls: config.max_concurrent_pulls,
            root,
        }
    }

    /// Pull the latest version of every image used by a repository.
    #[instrument(level = "info", skip(self))]
    pub async fn upgrade_images(&self) -> SweepReport {
        let images = match self.store.distinct_images().await {
            Ok(images) => images,
            Err(e) => {
                warn!(target: "yuki.core.sweeper", error = %e, "cannot enumerate repository images");
                return SweepReport::abort(e);
            }
        };

        let mut group = TaskGroup::new(self.max_concurrent_pulls);
        for image in images {
            let runtime = Arc::clone(&self.runtime);
            let ctx = self.root.child();
            group.spawn(async move {
                let res = runtime.pull_image(&ctx, &image).await;
                (image, res)
            });
        }

        let mut report = SweepReport {
            attempted: group.len(),
            ..Default::default()
        };
        let joined = group.join_all().await;
        report.lost = joined.lost;
        for (image, res) in joined.outputs {
            match res {
                Ok(()) => debug!(target: "yuki.core.sweeper", %image, "image upgraded"),
                Err(e) => {
                    warn!(target: "yuki.core.sweeper", %image, error = %e, "image upgrade failed");
                    report.fail(image, e);
                }
            }
        }

        info!(target: "yuki.core.sweeper", attempted = report.attempted, failed = report.failed.len(), "images upgraded");
        report
    }

    /// Remove dangling images built for sync jobs.
    #[instrument(level = "info", skip(self))]
    pub async fn clean_images(&self) -> SweepReport {
        let ctx = self.root.child().with_timeout(self.sweep_timeout);
        let filter = ImageFilter::new().dangling().with_label(LABEL_IMAGES, "true");

        let images = match self.runtime.list_images(&ctx, &filter).await {
            Ok(images) => images,
            Err(e) => {
                warn!(target: "yuki.core.sweeper", error = %e, "cannot list dangling images");
                return SweepReport::abort(e);
            }
        };

        let mut report = SweepReport::default();
        for image in images {
            report.attempted += 1;
            if let Err(e) = self.runtime.remove_image(&ctx, &image.id).await {
                warn!(target: "yuki.core.sweeper", image = %image.id, error = %e, "cannot remove dangling image");
                report.fail(image.id, e);
            }
        }

        info!(target: "yuki.core.sweeper", removed = report.succeeded(), "dangling images cleaned");
        report
    }

    /// Force-remove sync containers that are no longer running, with their volumes.
    #[instrument(level = "info", skip(self))]
    pub async fn clean_dead_containers(&self) -> SweepReport {
        let ctx = self.root.child().with_timeout(self.sweep_timeout);
        let filter = ContainerStatus::DEAD
            .into_iter()
            .fold(ContainerFilter::new().with_label(LABEL_SYNCING, "true"), ContainerFilter::with_status);

        let containers = match self.runtime.list_containers(&ctx, &filter).await {
            Ok(cts) => cts,
            Err(e) => {
                warn!(target: "yuki.core.sweeper", error = %e, "cannot list dead containers");
                return SweepReport::abort(e);
            }
        };

        let mut report = SweepReport::default();
        for ct in containers {
            report.attempted += 1;
            let remove_ctx = self.root.child().with_timeout(self.remove_timeout);
            if let Err(e) = self
                .runtime
                .remove_container(&remove_ctx, &ct.id, RemoveOptions::purge())
                .await
            {
                warn!(target: "yuki.core.sweeper", id = %ct.id, error = %e, "cannot remove dead container");
                report.fail(ct.id, e);
            }
        }

        info!(target: "yuki.core.sweeper", removed = report.succeeded(), "dead containers cleaned");
        report
    }

    /// Attach a waiter to every running sync container.
    ///
    /// Used after a restart to pick up jobs started by a previous daemon. Every waiter starts at once, since a
    /// sync job may run for hours. Returns as soon as the waiters are spawned; their outcomes are logged when
    /// they finish.
    #[instrument(level = "info", skip(self))]
    pub async fn wait_running_containers(&self) -> SweepReport {
        let ctx = self.root.child().with_timeout(self.sweep_timeout);
        let filter = ContainerFilter::new()
            .with_label(LABEL_SYNCING, "true")
            .with_status(ContainerStatus::Running);

        let running = match self.runtime.list_containers(&ctx, &filter).await {
            Ok(cts) => cts,
            Err(e) => {
                warn!(target: "yuki.core.sweeper", error = %e, "cannot list running containers");
                return SweepReport::abort(e);
            }
        };

        let mut group = TaskGroup::unbounded();
        for summary in running {
            let ct = Container::from(summary);
            let waiter = self.waiter.clone();
            group.spawn(async move {
                let id = ct.id.clone();
                (id, waiter.wait(ct).await)
            });
        }

        let report = SweepReport {
            attempted: group.len(),
            ..Default::default()
        };
        info!(target: "yuki.core.sweeper", count = report.attempted, "waiting for rediscovered containers");

        tokio::spawn(async move {
            let joined = group.join_all().await;
            for (id, res) in joined.outputs {
                if let Err(e) = res {
                    error!(target: "yuki.core.sweeper", %id, error = %e, "waiting for rediscovered container failed");
                }
            }
        });
        report
    }
}

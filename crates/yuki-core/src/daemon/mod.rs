//! Facade over the lifecycle components, sharing one runtime, store, sink and root context.

mod builder;
pub use builder::DaemonCoreBuilder;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, instrument};
use yuki_model::{Container, SyncOptions};

use crate::{
    config::CoreConfig,
    error::CoreError,
    events::EventSink,
    launcher::Launcher,
    logs::{LogStreamer, LogsOptions},
    runtime::{CallContext, RemoveOptions, RuntimeClient},
    store::RepositoryStore,
    sweeper::{SweepReport, Sweeper},
    waiter::Waiter,
};

pub struct DaemonCore {
    config: CoreConfig,
    runtime: Arc<dyn RuntimeClient>,
    root: CallContext,
    launcher: Launcher,
    waiter: Waiter,
    sweeper: Sweeper,
    logs: LogStreamer,
}

impl DaemonCore {
    pub fn builder(config: CoreConfig) -> DaemonCoreBuilder {
        DaemonCoreBuilder::new(config)
    }

    pub(crate) fn assemble(
        config: CoreConfig,
        runtime: Arc<dyn RuntimeClient>,
        store: Arc<dyn RepositoryStore>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let root = CallContext::new();
        let launcher = Launcher::new(Arc::clone(&runtime), Arc::clone(&store), &config, root.clone());
        let waiter = Waiter::new(Arc::clone(&runtime), sink, &config);
        let sweeper = Sweeper::new(
            Arc::clone(&runtime),
            store,
            waiter.clone(),
            &config,
            root.clone(),
        );
        let logs = LogStreamer::new(Arc::clone(&runtime), root.clone());

        info!(runtime = runtime.name(), "daemon core assembled");
        Self {
            config,
            runtime,
            root,
            launcher,
            waiter,
            sweeper,
            logs,
        }
    }

    #[inline]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub async fn sync(&self, opts: &SyncOptions) -> Result<Container, CoreError> {
        self.launcher.sync(opts).await
    }

    pub async fn wait_for_sync(&self, ct: Container) -> Result<i64, CoreError> {
        self.waiter.wait(ct).await
    }

    /// Launch a sync job and wait for it on a background task, honouring `opts.timeout`.
    pub async fn sync_and_wait(
        &self,
        opts: &SyncOptions,
    ) -> Result<(Container, JoinHandle<Result<i64, CoreError>>), CoreError> {
        let ct = self.launcher.sync(opts).await?;
        let waiter = self.waiter.clone();
        let job = ct.clone();
        let timeout = opts.timeout;
        let handle = tokio::spawn(async move { waiter.wait_with_timeout(job, timeout).await });
        Ok((ct, handle))
    }

    pub async fn container_logs(&self, opts: LogsOptions) -> Result<(), CoreError> {
        self.logs.stream(opts).await
    }

    pub async fn upgrade_images(&self) -> SweepReport {
        self.sweeper.upgrade_images().await
    }

    pub async fn clean_images(&self) -> SweepReport {
        self.sweeper.clean_images().await
    }

    pub async fn clean_dead_containers(&self) -> SweepReport {
        self.sweeper.clean_dead_containers().await
    }

    pub async fn wait_running_containers(&self) -> SweepReport {
        self.sweeper.wait_running_containers().await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn pull_image(&self, image: &str) -> Result<(), CoreError> {
        self.runtime.pull_image(&self.root.child(), image).await?;
        Ok(())
    }

    /// Stop a container, killing it after the configured grace period.
    #[instrument(level = "info", skip(self))]
    pub async fn stop_container(&self, id: &str) -> Result<(), CoreError> {
        let ctx = self.root.child().with_timeout(self.config.stop_deadline());
        self.runtime
            .stop_container(&ctx, id, self.config.stop_grace())
            .await?;
        Ok(())
    }

    /// Force-remove a container together with its volumes.
    #[instrument(level = "info", skip(self))]
    pub async fn remove_container(&self, id: &str) -> Result<(), CoreError> {
        let ctx = self.root.child().with_timeout(self.config.remove_timeout());
        self.runtime
            .remove_container(&ctx, id, RemoveOptions::purge())
            .await?;
        Ok(())
    }

    /// Cancel every in-flight call made through the root context, such as log streams and pulls.
    ///
    /// Waiters are not affected: they run until their container exits.
    pub fn shutdown(&self) {
        info!("daemon core shutting down");
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

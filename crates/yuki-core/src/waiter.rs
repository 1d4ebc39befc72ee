use std::{sync::Arc, time::Duration};

use tracing::{debug, info, instrument, warn};
use yuki_model::{Container, LABEL_NAME, LABEL_STORAGE_DIR, Payload};

use crate::{
    config::{CoreConfig, stop_deadline},
    error::CoreError,
    events::EventSink,
    runtime::{CallContext, RuntimeClient, RuntimeError},
};

/// Lifecycle waiter: blocks until a sync container exits and reports it.
///
/// Within one call `SyncStart` is emitted before the blocking wait and `SyncEnd` after it. Waiters of different
/// containers are independent, so their events may interleave.
#[derive(Clone)]
pub struct Waiter {
    runtime: Arc<dyn RuntimeClient>,
    sink: Arc<dyn EventSink>,
    stop_grace: Duration,
}

impl Waiter {
    pub fn new(runtime: Arc<dyn RuntimeClient>, sink: Arc<dyn EventSink>, config: &CoreConfig) -> Self {
        Self {
            runtime,
            sink,
            stop_grace: config.stop_grace(),
        }
    }

    /// Wait for the container's natural exit and return its exit code.
    pub async fn wait(&self, ct: Container) -> Result<i64, CoreError> {
        self.wait_with_timeout(ct, None).await
    }

    /// Like [`Waiter::wait`], but stops the container once `timeout` elapsed.
    ///
    /// The wait continues after the stop, so `SyncEnd` carries the exit code the runtime reports for the
    /// stopped container.
    #[instrument(level = "debug", skip(self, ct), fields(id = %ct.id))]
    pub async fn wait_with_timeout(&self, ct: Container, timeout: Option<Duration>) -> Result<i64, CoreError> {
        self.sink
            .emit(Payload::sync_start(ct.repo_name().unwrap_or_default()));

        let code = self.block(&ct.id, timeout).await?;

        let name = ct.repo_name().ok_or(CoreError::MissingLabel(LABEL_NAME))?;
        let dir = ct
            .storage_dir()
            .ok_or(CoreError::MissingLabel(LABEL_STORAGE_DIR))?;

        info!(target: "yuki.core.waiter", id = %ct.id, name, exit_code = code, "sync container exited");
        self.sink
            .emit(Payload::sync_end(ct.id.as_str(), name, dir, code));
        Ok(code)
    }

    async fn block(&self, id: &str, timeout: Option<Duration>) -> Result<i64, RuntimeError> {
        let ctx = CallContext::new();
        let wait = self.runtime.wait_container(&ctx, id);
        let Some(limit) = timeout else {
            return wait.await;
        };

        tokio::pin!(wait);
        tokio::select! {
            res = &mut wait => return res,
            _ = tokio::time::sleep(limit) => {}
        }

        warn!(target: "yuki.core.waiter", id, ?limit, "sync job exceeded its timeout; stopping");
        let stop_ctx = CallContext::new().with_timeout(stop_deadline(self.stop_grace));
        match self.runtime.stop_container(&stop_ctx, id, self.stop_grace).await {
            Ok(()) => debug!(target: "yuki.core.waiter", id, "stop requested"),
            Err(e) => warn!(target: "yuki.core.waiter", id, error = %e, "failed to stop timed out container"),
        }
        wait.await
    }
}

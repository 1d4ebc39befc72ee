use std::{fmt, sync::Arc};

use tokio::{io::AsyncWrite, sync::oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use yuki_model::ContainerId;

use crate::{
    error::CoreError,
    runtime::{CallContext, LogsRequest, RuntimeClient, RuntimeError},
};

/// Parameters of a log streaming call.
pub struct LogsOptions {
    pub id: ContainerId,
    /// Receives combined stdout and stderr.
    pub stream: Box<dyn AsyncWrite + Send + Unpin>,
    /// Number of trailing lines, or `"all"`.
    pub tail: String,
    pub follow: bool,
    /// Cancelled by the caller when it no longer wants output.
    pub close_notify: CancellationToken,
}

impl LogsOptions {
    pub fn new(id: impl Into<ContainerId>, stream: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            id: id.into(),
            stream: Box::new(stream),
            tail: "all".to_string(),
            follow: false,
            close_notify: CancellationToken::new(),
        }
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    pub fn with_close_notify(mut self, token: CancellationToken) -> Self {
        self.close_notify = token;
        self
    }
}

impl fmt::Debug for LogsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogsOptions")
            .field("id", &self.id)
            .field("tail", &self.tail)
            .field("follow", &self.follow)
            .finish_non_exhaustive()
    }
}

/// Streams container output, stoppable by the caller or by core shutdown.
#[derive(Clone)]
pub struct LogStreamer {
    runtime: Arc<dyn RuntimeClient>,
    root: CallContext,
}

impl LogStreamer {
    pub fn new(runtime: Arc<dyn RuntimeClient>, root: CallContext) -> Self {
        Self { runtime, root }
    }

    /// Copy the container's output into `opts.stream`.
    ///
    /// Returns `Ok` when the stream ends or is cancelled through `close_notify`; other faults are returned.
    #[instrument(level = "debug", skip(self, opts), fields(id = %opts.id, follow = opts.follow))]
    pub async fn stream(&self, opts: LogsOptions) -> Result<(), CoreError> {
        let LogsOptions {
            id,
            mut stream,
            tail,
            follow,
            close_notify,
        } = opts;

        let ctx = self.root.child();
        let (finished_tx, finished_rx) = oneshot::channel::<()>();
        let watcher = {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = close_notify.cancelled() => debug!(target: "yuki.core.logs", "log stream closed by caller"),
                    _ = finished_rx => {}
                }
                ctx.cancel();
            })
        };

        let req = LogsRequest {
            tail,
            follow,
            ..Default::default()
        };
        let res = self.runtime.logs(&ctx, &id, &req, stream.as_mut()).await;

        drop(finished_tx);
        if let Err(e) = watcher.await {
            warn!(target: "yuki.core.logs", error = %e, "log watcher did not complete");
        }

        match res {
            Ok(()) | Err(RuntimeError::Cancelled) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

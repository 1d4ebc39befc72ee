use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::runtime::RuntimeError;

/// Cancellation and deadline scope of a runtime call.
///
/// Contexts form a tree through [`CallContext::child`]: cancelling a parent cancels every child, and a child
/// never outlives its parent's deadline.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighten the deadline to `timeout` from now. An earlier deadline is kept, and a timeout too large to
    /// represent leaves the context without a new deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let Some(at) = Instant::now().checked_add(timeout) else {
            return self;
        };
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < at => existing,
            _ => at,
        });
        self
    }

    /// Derived context: cancelled with `self`, cancellable on its own without affecting `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` until it completes, the context is cancelled, or the deadline passes.
    ///
    /// Cancellation wins over an expired deadline, and both win over a result that becomes ready in the
    /// same poll.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, RuntimeError>
    where
        F: Future<Output = Result<T, RuntimeError>>,
    {
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(RuntimeError::Cancelled),
            _ = expired => Err(RuntimeError::DeadlineExceeded),
            res = fut => res,
        }
    }
}

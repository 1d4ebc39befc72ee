use std::{future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tracing::error;

/// Set of spawned tasks, optionally of which at most `limit` run at once.
///
/// Tasks are spawned immediately and queue on a semaphore, so [`TaskGroup::spawn`] never blocks.
pub struct TaskGroup<T> {
    set: JoinSet<T>,
    permits: Option<Arc<Semaphore>>,
}

/// Outputs of all members of a joined [`TaskGroup`].
#[derive(Debug)]
pub struct Joined<T> {
    /// Outputs in completion order.
    pub outputs: Vec<T>,
    /// Members that panicked or were aborted.
    pub lost: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            set: JoinSet::new(),
            permits: Some(Arc::new(Semaphore::new(limit.max(1)))),
        }
    }

    /// Group whose members all run at once.
    pub fn unbounded() -> Self {
        Self {
            set: JoinSet::new(),
            permits: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permits = self.permits.clone();
        self.set.spawn(async move {
            // The semaphore is never closed, so the permit is always granted.
            let _permit = match permits {
                Some(permits) => permits.acquire_owned().await.ok(),
                None => None,
            };
            fut.await
        });
    }

    /// Wait for every member and collect their outputs.
    pub async fn join_all(mut self) -> Joined<T> {
        let mut outputs = Vec::with_capacity(self.set.len());
        let mut lost = 0;
        while let Some(res) = self.set.join_next().await {
            match res {
                Ok(out) => outputs.push(out),
                Err(e) => {
                    lost += 1;
                    error!(error = %e, "task group member did not complete");
                }
            }
        }
        Joined { outputs, lost }
    }
}

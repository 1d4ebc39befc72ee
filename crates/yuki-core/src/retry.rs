use std::future::Future;

use tracing::debug;

use crate::runtime::RuntimeError;

/// Recovery policy for a create that fails because the image is not present locally.
///
/// On [`RuntimeError::ImageNotFound`] the image is pulled and the create retried, at most `max_pulls` times.
/// A failed pull, any other create error, and the error of the last allowed retry are returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingImageRetry {
    max_pulls: u32,
}

impl Default for MissingImageRetry {
    fn default() -> Self {
        Self { max_pulls: 1 }
    }
}

impl MissingImageRetry {
    pub fn new(max_pulls: u32) -> Self {
        Self { max_pulls }
    }

    pub async fn run<T, C, CF, P, PF>(&self, mut create: C, mut pull: P) -> Result<T, RuntimeError>
    where
        C: FnMut() -> CF,
        CF: Future<Output = Result<T, RuntimeError>>,
        P: FnMut() -> PF,
        PF: Future<Output = Result<(), RuntimeError>>,
    {
        let mut pulls = 0;
        loop {
            match create().await {
                Err(RuntimeError::ImageNotFound(image)) if pulls < self.max_pulls => {
                    pulls += 1;
                    debug!(%image, attempt = pulls, "image missing locally; pulling before retry");
                    pull().await?;
                }
                other => return other,
            }
        }
    }
}

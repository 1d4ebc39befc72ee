use std::time::Duration;

use serde::Deserialize;

use crate::error::CoreError;

/// Longest accepted stop grace period.
pub const MAX_STOP_GRACE_SECS: u64 = 3600;

/// Extra time granted to a stop call on top of the grace period.
pub(crate) const STOP_SLACK: Duration = Duration::from_secs(5);

/// Tunables of the daemon core.
///
/// Every field has a default, so a partial config file deserializes into a complete value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Budget for listing calls of the bulk sweeps.
    pub sweep_timeout_ms: u64,
    /// Budget for a single container removal.
    pub remove_timeout_ms: u64,
    /// Grace period given to a container before it is killed on stop.
    pub stop_grace_secs: u64,
    /// Upper bound on concurrent image pulls during an upgrade.
    pub max_concurrent_pulls: usize,
    /// How many times a create that failed on a missing image is retried after pulling it.
    pub image_pull_retries: u32,
    /// Remove a created container when starting it fails.
    pub rollback_on_start_failure: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            sweep_timeout_ms: 10_000,
            remove_timeout_ms: 20_000,
            stop_grace_secs: 10,
            max_concurrent_pulls: 4,
            image_pull_retries: 1,
            rollback_on_start_failure: true,
        }
    }
}

pub(crate) fn stop_deadline(grace: Duration) -> Duration {
    grace.saturating_add(STOP_SLACK)
}

impl CoreConfig {
    #[inline]
    pub fn sweep_timeout(&self) -> Duration {
        Duration::from_millis(self.sweep_timeout_ms)
    }

    #[inline]
    pub fn remove_timeout(&self) -> Duration {
        Duration::from_millis(self.remove_timeout_ms)
    }

    #[inline]
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    /// Deadline of a stop call: the grace period plus a few seconds of slack.
    #[inline]
    pub fn stop_deadline(&self) -> Duration {
        stop_deadline(self.stop_grace())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sweep_timeout_ms == 0 {
            return Err(CoreError::Config("sweepTimeoutMs must be > 0".into()));
        }
        if self.remove_timeout_ms == 0 {
            return Err(CoreError::Config("removeTimeoutMs must be > 0".into()));
        }
        if self.max_concurrent_pulls == 0 {
            return Err(CoreError::Config("maxConcurrentPulls must be > 0".into()));
        }
        if self.stop_grace_secs > MAX_STOP_GRACE_SECS {
            return Err(CoreError::Config(format!(
                "stopGraceSecs must be <= {MAX_STOP_GRACE_SECS}"
            )));
        }
        Ok(())
    }
}

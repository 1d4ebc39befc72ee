use std::{fmt, path::PathBuf, time::Duration};

use serde::Deserialize;

/// Where the Docker daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    /// `DOCKER_HOST` or the platform default socket.
    Local,
    Unix(PathBuf),
}

impl fmt::Display for DockerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DockerEndpoint::Local => f.write_str("local defaults"),
            DockerEndpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerConfig {
    /// Unix socket of the daemon; unset means local defaults.
    pub socket: Option<PathBuf>,
    /// HTTP timeout of every request that is not a stream.
    pub timeout_secs: u64,
    /// A pull that reports no progress for this long is abandoned.
    pub pull_inactivity_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            socket: None,
            timeout_secs: 120,
            pull_inactivity_secs: 10,
        }
    }
}

impl DockerConfig {
    pub fn endpoint(&self) -> DockerEndpoint {
        match &self.socket {
            Some(path) => DockerEndpoint::Unix(path.clone()),
            None => DockerEndpoint::Local,
        }
    }

    #[inline]
    pub fn pull_inactivity(&self) -> Duration {
        Duration::from_secs(self.pull_inactivity_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_local_endpoint() {
        let cfg = DockerConfig::default();
        assert_eq!(cfg.endpoint(), DockerEndpoint::Local);
        assert_eq!(cfg.pull_inactivity(), Duration::from_secs(10));
    }

    #[test]
    fn socket_selects_unix_endpoint() {
        let cfg: DockerConfig = serde_json::from_str(r#"{"socket":"/run/docker.sock"}"#).unwrap();
        assert_eq!(cfg.timeout_secs, 120);
        assert_eq!(cfg.endpoint().to_string(), "unix:///run/docker.sock");
    }
}

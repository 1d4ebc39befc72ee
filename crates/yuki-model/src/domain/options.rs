use std::{path::PathBuf, time::Duration};

/// Parameters of one launch call.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Repository name to sync.
    pub name: String,
    /// Parent of the per-repository log directories.
    pub log_dir: PathBuf,
    pub default_owner: String,
    pub default_bind_ip: String,
    /// Prepended to the repository name to form the container name.
    pub name_prefix: String,
    pub debug: bool,
    /// Mount the storage and log directories into the container.
    pub mount_dir: bool,
    /// Upper bound on the job's run time. `None` lets it run until it exits.
    pub timeout: Option<Duration>,
}

impl SyncOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Deterministic container name: at most one job per repository can hold it.
    pub fn container_name(&self) -> String {
        format!("{}{}", self.name_prefix, self.name)
    }

    /// Host directory mounted at the container's log mount point.
    pub fn repo_log_dir(&self) -> PathBuf {
        self.log_dir.join(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_is_prefix_plus_name() {
        let opts = SyncOptions {
            name_prefix: "yuki-".into(),
            ..SyncOptions::new("alpine-repo")
        };
        assert_eq!(opts.container_name(), "yuki-alpine-repo");
    }

    #[test]
    fn repo_log_dir_joins_name() {
        let opts = SyncOptions {
            log_dir: PathBuf::from("/var/log/yuki"),
            ..SyncOptions::new("debian")
        };
        assert_eq!(opts.repo_log_dir(), PathBuf::from("/var/log/yuki/debian"));
    }
}

//! Job Launcher: turns a repository record into a running sync container.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info, instrument, warn};
use yuki_model::{
    Container, ContainerId, DATA_MOUNT_POINT, EnvSet, LABEL_NAME, LABEL_STORAGE_DIR,
    LABEL_SYNCING, LOG_MOUNT_POINT, Labels, Repository, SyncOptions,
};

use crate::{
    config::CoreConfig,
    error::CoreError,
    retry::MissingImageRetry,
    runtime::{CallContext, ContainerSpec, RemoveOptions, RuntimeClient},
    store::RepositoryStore,
};

const NETWORK_MODE_HOST: &str = "host";

#[derive(Clone)]
pub struct Launcher {
    runtime: Arc<dyn RuntimeClient>,
    store: Arc<dyn RepositoryStore>,
    retry: MissingImageRetry,
    rollback_on_start_failure: bool,
    remove_timeout: Duration,
    root: CallContext,
}

impl Launcher {
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        store: Arc<dyn RepositoryStore>,
        config: &CoreConfig,
        root: CallContext,
    ) -> Self {
        Self {
            runtime,
            store,
            retry: MissingImageRetry::new(config.image_pull_retries),
            rollback_on_start_failure: config.rollback_on_start_failure,
            remove_timeout: config.remove_timeout(),
            root,
        }
    }

    /// Create and start the sync container of `opts.name`.
    ///
    /// The container name is deterministic, so a second launch while the first container still exists fails
    /// in the runtime with a conflict.
    #[instrument(level = "info", skip(self, opts), fields(repo = %opts.name))]
    pub async fn sync(&self, opts: &SyncOptions) -> Result<Container, CoreError> {
        let repo = self
            .store
            .get(&opts.name)
            .await?
            .with_defaults(&opts.default_bind_ip, &opts.default_owner);

        let mut spec = build_spec(&repo, opts);
        if opts.mount_dir {
            spec.binds.extend(prepare_mounts(&repo, opts).await?);
        }

        let id = self.create(&spec).await?;
        self.start(&id).await?;

        info!(target: "yuki.core.launcher", id = %id, name = %spec.name, image = %spec.image, "sync container started");
        Ok(Container::new(id, spec.labels))
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, CoreError> {
        let runtime = self.runtime.as_ref();
        let ctx = &self.root;
        let id = self
            .retry
            .run(
                move || runtime.create_container(ctx, spec),
                move || runtime.pull_image(ctx, &spec.image),
            )
            .await?;
        debug!(target: "yuki.core.launcher", id = %id, "container created");
        Ok(id)
    }

    async fn start(&self, id: &str) -> Result<(), CoreError> {
        let Err(err) = self.runtime.start_container(&self.root, id).await else {
            return Ok(());
        };
        warn!(target: "yuki.core.launcher", id, error = %err, "failed to start container");

        if self.rollback_on_start_failure {
            let ctx = self.root.child().with_timeout(self.remove_timeout);
            match self
                .runtime
                .remove_container(&ctx, id, RemoveOptions::purge())
                .await
            {
                Ok(()) => debug!(target: "yuki.core.launcher", id, "removed container that failed to start"),
                Err(e) => warn!(target: "yuki.core.launcher", id, error = %e, "cannot remove container that failed to start"),
            }
        }
        Err(err.into())
    }
}

/// Container description of `repo` without the directory mounts.
///
/// `repo` is expected to carry its defaults already (see [`Repository::with_defaults`]).
pub fn build_spec(repo: &Repository, opts: &SyncOptions) -> ContainerSpec {
    let mut env: EnvSet = repo.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    env.set("REPO", repo.name.as_str());
    env.set("OWNER", repo.user.as_str());
    env.set("BIND_ADDRESS", repo.bind_ip.as_str());
    env.set_int("RETRY", repo.retry);
    env.set_int("LOG_ROTATE_CYCLE", repo.log_rot_cycle);
    env.set_bool("DEBUG", opts.debug);

    let binds = repo
        .volumes
        .iter()
        .map(|(host, container)| format!("{host}:{container}"))
        .collect();

    ContainerSpec {
        name: opts.container_name(),
        image: repo.image.clone(),
        env,
        labels: sync_labels(repo),
        binds,
        open_stdin: true,
        network_mode: NETWORK_MODE_HOST.to_string(),
    }
}

fn sync_labels(repo: &Repository) -> Labels {
    let mut labels = Labels::new();
    labels.insert(LABEL_NAME.to_string(), repo.name.clone());
    labels.insert(LABEL_SYNCING.to_string(), "true".to_string());
    labels.insert(
        LABEL_STORAGE_DIR.to_string(),
        repo.storage_dir.to_string_lossy().into_owned(),
    );
    labels
}

/// Create the log directory and check the storage directory; returns their binds.
async fn prepare_mounts(repo: &Repository, opts: &SyncOptions) -> Result<Vec<String>, CoreError> {
    let log_dir = opts.repo_log_dir();
    tokio::fs::create_dir_all(&log_dir)
        .await
        .map_err(|e| CoreError::Filesystem {
            path: log_dir.clone(),
            reason: e.to_string(),
        })?;

    let is_dir = tokio::fs::metadata(&repo.storage_dir)
        .await
        .is_ok_and(|m| m.is_dir());
    if !is_dir {
        return Err(CoreError::NotADirectory(repo.storage_dir.clone()));
    }

    Ok(vec![
        format!("{}:{}", repo.storage_dir.display(), DATA_MOUNT_POINT),
        format!("{}:{}", log_dir.display(), LOG_MOUNT_POINT),
    ])
}

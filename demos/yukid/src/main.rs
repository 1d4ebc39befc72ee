use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use yuki_core::{CoreConfig, DaemonCore, EventBus, LogsOptions, MemoryStore, Subscribe};
use yuki_docker::{DockerConfig, DockerRuntime};
use yuki_model::{Repository, SyncOptions};
use yuki_observe::{EventLog, LoggerConfig, logger_init};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SyncDefaults {
    log_dir: PathBuf,
    name_prefix: String,
    default_owner: String,
    default_bind_ip: String,
    mount_dir: bool,
    debug: bool,
    timeout_secs: Option<u64>,
}

impl SyncDefaults {
    fn options_for(&self, name: &str) -> SyncOptions {
        SyncOptions {
            log_dir: self.log_dir.clone(),
            name_prefix: self.name_prefix.clone(),
            default_owner: self.default_owner.clone(),
            default_bind_ip: self.default_bind_ip.clone(),
            mount_dir: self.mount_dir,
            debug: self.debug,
            timeout: self.timeout_secs.map(Duration::from_secs),
            ..SyncOptions::new(name)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DaemonFile {
    core: CoreConfig,
    docker: DockerConfig,
    sync: SyncDefaults,
    repositories: Vec<Repository>,
}

fn load(path: Option<&str>) -> anyhow::Result<DaemonFile> {
    let Some(path) = path else {
        return Ok(DaemonFile::default());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}

/// Usage: `yukid [config.json] [repository]`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    logger_init(&LoggerConfig::from_env()?)?;

    let mut args = std::env::args().skip(1);
    let file = load(args.next().as_deref())?;
    let target = args.next();

    // 2) Runtime
    let runtime = DockerRuntime::connect(&file.docker)?;
    runtime.ping().await?;

    // 3) Core
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(EventLog::new())];
    let core = DaemonCore::builder(file.core)
        .with_runtime(Arc::new(runtime))
        .with_store(Arc::new(MemoryStore::with_repositories(file.repositories)))
        .with_sink(Arc::new(EventBus::new(subscribers)))
        .build()?;
    info!("daemon core ready");

    // 4) Recover jobs of a previous run, then tidy up
    let report = core.wait_running_containers().await;
    info!(rediscovered = report.attempted, "restart recovery done");
    let report = core.clean_dead_containers().await;
    info!(removed = report.succeeded(), failed = report.failed.len(), "dead containers cleaned");
    let report = core.clean_images().await;
    info!(removed = report.succeeded(), "dangling images cleaned");

    // 5) Optional one-off sync with followed logs
    let Some(name) = target else {
        info!("no repository given; idle until ctrl-c");
        tokio::signal::ctrl_c().await?;
        core.shutdown();
        return Ok(());
    };

    let core = Arc::new(core);
    let (ct, waiting) = core.sync_and_wait(&file.sync.options_for(&name)).await?;
    info!(id = %ct.id, repo = %name, "sync launched; following logs");

    let close = CancellationToken::new();
    let opts = LogsOptions::new(ct.id.clone(), tokio::io::stdout())
        .with_follow(true)
        .with_tail("100")
        .with_close_notify(close.clone());
    let streaming = Arc::clone(&core);
    let logs = tokio::spawn(async move { streaming.container_logs(opts).await });

    // 6) Wait for the job or ctrl-c
    tokio::select! {
        res = waiting => match res? {
            Ok(code) => info!(exit_code = code, "sync finished"),
            Err(e) => warn!(error = %e, "sync failed"),
        },
        _ = tokio::signal::ctrl_c() => info!("interrupted; the sync container keeps running"),
    }
    close.cancel();
    if let Err(e) = logs.await? {
        warn!(error = %e, "log stream failed");
    }
    core.shutdown();

    info!("shutting down");
    Ok(())
}

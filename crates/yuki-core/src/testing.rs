use std::{
    collections::{HashMap, HashSet, VecDeque},
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
    time::Duration,
};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use yuki_model::{ContainerId, ContainerStatus, Labels, Payload};

use crate::{
    events::EventSink,
    runtime::{
        CallContext, ContainerFilter, ContainerSpec, ContainerSummary, ImageFilter, ImageSummary,
        LogsRequest, RemoveOptions, RuntimeClient, RuntimeError,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Start(String),
    Stop(String),
    Remove(String),
    ListContainers,
    Wait(String),
    Logs(String),
    Pull(String),
    RemoveImage(String),
    ListImages,
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub name: String,
    pub spec: Option<ContainerSpec>,
    pub labels: Labels,
    pub status: ContainerStatus,
}

#[derive(Default)]
struct State {
    images: HashSet<String>,
    containers: HashMap<ContainerId, FakeContainer>,
    dangling: Vec<ImageSummary>,
    calls: Vec<Call>,
    create_errors: VecDeque<RuntimeError>,
    start_error: Option<RuntimeError>,
    pull_error: Option<RuntimeError>,
    pull_errors: HashMap<String, RuntimeError>,
    list_error: Option<RuntimeError>,
    wait_error: Option<RuntimeError>,
    remove_errors: HashMap<String, RuntimeError>,
    exit_codes: HashMap<ContainerId, i64>,
    logs: HashMap<ContainerId, Vec<u8>>,
    hold_wait: bool,
    next_id: u64,
}

/// In-memory runtime with scripted failures and a call log.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    state: Arc<Mutex<State>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn with_image(self, image: &str) -> Self {
        self.with(|s| s.images.insert(image.to_string()));
        self
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.with(|s| s.images.contains(image))
    }

    pub fn seed_container(&self, id: &str, labels: Labels, status: ContainerStatus) {
        self.with(|s| {
            s.containers.insert(
                id.to_string(),
                FakeContainer {
                    name: id.to_string(),
                    spec: None,
                    labels,
                    status,
                },
            )
        });
    }

    pub fn seed_dangling_image(&self, id: &str, labels: Labels) {
        self.with(|s| {
            s.dangling.push(ImageSummary {
                id: id.to_string(),
                labels,
                dangling: true,
            })
        });
    }

    pub fn push_create_error(&self, err: RuntimeError) {
        self.with(|s| s.create_errors.push_back(err));
    }

    pub fn fail_start(&self, err: RuntimeError) {
        self.with(|s| s.start_error = Some(err));
    }

    pub fn fail_pull(&self, err: RuntimeError) {
        self.with(|s| s.pull_error = Some(err));
    }

    pub fn fail_pull_of(&self, image: &str, err: RuntimeError) {
        self.with(|s| s.pull_errors.insert(image.to_string(), err));
    }

    pub fn fail_list(&self, err: RuntimeError) {
        self.with(|s| s.list_error = Some(err));
    }

    pub fn fail_wait(&self, err: RuntimeError) {
        self.with(|s| s.wait_error = Some(err));
    }

    pub fn fail_remove(&self, id: &str, err: RuntimeError) {
        self.with(|s| s.remove_errors.insert(id.to_string(), err));
    }

    pub fn set_exit_code(&self, id: &str, code: i64) {
        self.with(|s| s.exit_codes.insert(id.to_string(), code));
    }

    pub fn set_logs(&self, id: &str, bytes: &[u8]) {
        self.with(|s| s.logs.insert(id.to_string(), bytes.to_vec()));
    }

    /// Make `wait_container` block until the context stops it.
    pub fn hold_wait(&self) {
        self.with(|s| s.hold_wait = true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.with(|s| s.calls.iter().filter(|c| pred(c)).count())
    }

    pub fn container(&self, id: &str) -> Option<FakeContainer> {
        self.with(|s| s.containers.get(id).cloned())
    }

    pub fn container_count(&self) -> usize {
        self.with(|s| s.containers.len())
    }
}

#[async_trait]
impl RuntimeClient for FakeRuntime {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_container(
        &self,
        ctx: &CallContext,
        spec: &ContainerSpec,
    ) -> Result<ContainerId, RuntimeError> {
        let res = self.with(|s| {
            s.calls.push(Call::Create(spec.name.clone()));
            if let Some(err) = s.create_errors.pop_front() {
                return Err(err);
            }
            if !s.images.contains(&spec.image) {
                return Err(RuntimeError::ImageNotFound(spec.image.clone()));
            }
            if s.containers.values().any(|c| c.name == spec.name) {
                return Err(RuntimeError::Conflict(format!(
                    "container name {} is already in use",
                    spec.name
                )));
            }
            s.next_id += 1;
            let id = format!("{}-{}", s.next_id, uuid::Uuid::new_v4().simple());
            s.containers.insert(
                id.clone(),
                FakeContainer {
                    name: spec.name.clone(),
                    spec: Some(spec.clone()),
                    labels: spec.labels.clone(),
                    status: ContainerStatus::Created,
                },
            );
            Ok(id)
        });
        ctx.run(async move { res }).await
    }

    async fn start_container(&self, _ctx: &CallContext, id: &str) -> Result<(), RuntimeError> {
        self.with(|s| {
            s.calls.push(Call::Start(id.to_string()));
            if let Some(err) = s.start_error.clone() {
                return Err(err);
            }
            match s.containers.get_mut(id) {
                Some(c) => {
                    c.status = ContainerStatus::Running;
                    Ok(())
                }
                None => Err(RuntimeError::NotFound(id.to_string())),
            }
        })
    }

    async fn stop_container(
        &self,
        _ctx: &CallContext,
        id: &str,
        _grace: Duration,
    ) -> Result<(), RuntimeError> {
        self.with(|s| {
            s.calls.push(Call::Stop(id.to_string()));
            s.hold_wait = false;
            match s.containers.get_mut(id) {
                Some(c) => {
                    c.status = ContainerStatus::Exited;
                    s.exit_codes.entry(id.to_string()).or_insert(137);
                    Ok(())
                }
                None => Err(RuntimeError::NotFound(id.to_string())),
            }
        })
    }

    async fn remove_container(
        &self,
        _ctx: &CallContext,
        id: &str,
        _opts: RemoveOptions,
    ) -> Result<(), RuntimeError> {
        self.with(|s| {
            s.calls.push(Call::Remove(id.to_string()));
            if let Some(err) = s.remove_errors.get(id) {
                return Err(err.clone());
            }
            s.containers
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
        })
    }

    async fn list_containers(
        &self,
        ctx: &CallContext,
        filter: &ContainerFilter,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let res = self.with(|s| {
            s.calls.push(Call::ListContainers);
            if let Some(err) = s.list_error.clone() {
                return Err(err);
            }
            let mut out: Vec<_> = s
                .containers
                .iter()
                .filter(|(_, c)| filter.matches(&c.labels, c.status))
                .map(|(id, c)| ContainerSummary {
                    id: id.clone(),
                    labels: c.labels.clone(),
                    status: Some(c.status),
                })
                .collect();
            out.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(out)
        });
        ctx.run(async move { res }).await
    }

    async fn wait_container(&self, ctx: &CallContext, id: &str) -> Result<i64, RuntimeError> {
        self.with(|s| s.calls.push(Call::Wait(id.to_string())));
        loop {
            let step = self.with(|s| {
                if let Some(err) = s.wait_error.clone() {
                    return Some(Err(err));
                }
                if s.hold_wait {
                    return None;
                }
                let code = s.exit_codes.get(id).copied().unwrap_or(0);
                if let Some(c) = s.containers.get_mut(id) {
                    c.status = ContainerStatus::Exited;
                }
                Some(Ok(code))
            });
            match step {
                Some(res) => return res,
                None => {
                    ctx.run(async {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Ok::<(), RuntimeError>(())
                    })
                    .await?
                }
            }
        }
    }

    async fn logs(
        &self,
        ctx: &CallContext,
        id: &str,
        req: &LogsRequest,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<(), RuntimeError> {
        let (bytes, running) = self.with(|s| {
            s.calls.push(Call::Logs(id.to_string()));
            let running = s
                .containers
                .get(id)
                .is_some_and(|c| c.status == ContainerStatus::Running);
            (s.logs.get(id).cloned().unwrap_or_default(), running)
        });
        ctx.run(async {
            sink.write_all(&bytes).await?;
            sink.flush().await?;
            if req.follow && running {
                std::future::pending::<()>().await;
            }
            Ok::<(), RuntimeError>(())
        })
        .await
    }

    async fn pull_image(&self, ctx: &CallContext, image: &str) -> Result<(), RuntimeError> {
        let res = self.with(|s| {
            s.calls.push(Call::Pull(image.to_string()));
            if let Some(err) = s.pull_error.clone().or_else(|| s.pull_errors.get(image).cloned()) {
                return Err(err);
            }
            s.images.insert(image.to_string());
            Ok(())
        });
        ctx.run(async move { res }).await
    }

    async fn remove_image(&self, _ctx: &CallContext, id: &str) -> Result<(), RuntimeError> {
        self.with(|s| {
            s.calls.push(Call::RemoveImage(id.to_string()));
            if let Some(err) = s.remove_errors.get(id) {
                return Err(err.clone());
            }
            s.dangling.retain(|i| i.id != id);
            Ok(())
        })
    }

    async fn list_images(
        &self,
        ctx: &CallContext,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageSummary>, RuntimeError> {
        let res = self.with(|s| {
            s.calls.push(Call::ListImages);
            if let Some(err) = s.list_error.clone() {
                return Err(err);
            }
            Ok(s.dangling.iter().filter(|i| filter.matches(i)).cloned().collect())
        });
        ctx.run(async move { res }).await
    }
}

/// Sink that keeps every emitted event in order.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Payload>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Payload> {
        self.events.lock().unwrap().clone()
    }

    /// Poll until at least `n` events arrived; panics after two seconds.
    pub async fn wait_for(&self, n: usize) -> Vec<Payload> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let events = self.events();
            if events.len() >= n {
                return events;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {n} events, got {}",
                events.len()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, payload: Payload) {
        self.events.lock().unwrap().push(payload);
    }
}

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl AsyncWrite for SharedBuf {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

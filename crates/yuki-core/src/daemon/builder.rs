use std::sync::Arc;

use crate::{
    config::CoreConfig,
    daemon::DaemonCore,
    error::CoreError,
    events::{EventSink, NoopSink},
    runtime::RuntimeClient,
    store::RepositoryStore,
};

/// Collects the collaborators of a [`DaemonCore`].
///
/// A runtime and a store are required; events go nowhere unless a sink is set.
pub struct DaemonCoreBuilder {
    config: CoreConfig,
    runtime: Option<Arc<dyn RuntimeClient>>,
    store: Option<Arc<dyn RepositoryStore>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl DaemonCoreBuilder {
    pub(crate) fn new(config: CoreConfig) -> Self {
        Self {
            config,
            runtime: None,
            store: None,
            sink: None,
        }
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn RuntimeClient>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn RepositoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<DaemonCore, CoreError> {
        self.config.validate()?;
        let runtime = self
            .runtime
            .ok_or_else(|| CoreError::Config("runtime client is not set".into()))?;
        let store = self
            .store
            .ok_or_else(|| CoreError::Config("repository store is not set".into()))?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(NoopSink));

        Ok(DaemonCore::assemble(self.config, runtime, store, sink))
    }
}

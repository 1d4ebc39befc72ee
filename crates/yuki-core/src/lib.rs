//! Container lifecycle core of the yuki mirror daemon.
//!
//! Sync jobs run as labeled containers on an external runtime. This crate launches them, waits for them,
//! sweeps up after them and streams their logs. There is no in-process job table: whatever the runtime
//! reports through labels is the state.

pub mod error;
pub use error::CoreError;

pub mod config;
pub use config::CoreConfig;

pub mod runtime;
pub use runtime::{CallContext, RuntimeClient, RuntimeError};

pub mod events;
pub use events::{EventBus, EventSink, NoopSink, Subscribe};

pub mod store;
pub use store::{MemoryStore, RepositoryStore, StoreError};

pub mod retry;
pub use retry::MissingImageRetry;

pub mod group;
pub use group::{Joined, TaskGroup};

pub mod launcher;
pub use launcher::Launcher;

pub mod waiter;
pub use waiter::Waiter;

pub mod sweeper;
pub use sweeper::{SweepFailure, SweepReport, Sweeper};

pub mod logs;
pub use logs::{LogStreamer, LogsOptions};

pub mod daemon;
pub use daemon::{DaemonCore, DaemonCoreBuilder};

#[cfg(test)]
pub(crate) mod testing;

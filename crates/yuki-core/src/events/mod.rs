//! Lifecycle event publishing.
//!
//! Emission is fire-and-forget: [`EventSink::emit`] returns nothing and never waits for consumers.

mod bus;
pub use bus::EventBus;

use async_trait::async_trait;
use yuki_model::Payload;

/// Destination of lifecycle events.
pub trait EventSink: Send + Sync {
    fn emit(&self, payload: Payload);
}

/// Consumer of lifecycle events attached to an [`EventBus`].
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Payload);

    fn name(&self) -> &'static str;

    /// Events buffered for this subscriber before new ones are dropped.
    fn queue_capacity(&self) -> usize {
        1024
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _payload: Payload) {}
}

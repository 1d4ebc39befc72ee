use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};
use yuki_model::Payload;

use crate::events::{EventSink, Subscribe};

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Payload>>,
}

/// Fan-out sink: every subscriber gets its own bounded queue and worker task.
///
/// A slow subscriber only loses its own events (with a warning); it never blocks the emitter or the other
/// subscribers. Workers exit once the bus is dropped and their queue drains.
pub struct EventBus {
    lanes: Vec<Lane>,
}

impl EventBus {
    /// Spawn one worker per subscriber. Must be called inside a tokio runtime.
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let lanes = subscribers
            .into_iter()
            .map(|sub| {
                let (tx, mut rx) = mpsc::channel::<Arc<Payload>>(sub.queue_capacity().max(1));
                let name = sub.name();
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        sub.on_event(&event).await;
                    }
                    trace!(subscriber = name, "event worker finished");
                });
                Lane { name, tx }
            })
            .collect();
        Self { lanes }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lanes.len()
    }
}

impl EventSink for EventBus {
    fn emit(&self, payload: Payload) {
        let kind = payload.kind.as_str();
        let event = Arc::new(payload);
        for lane in &self.lanes {
            match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = lane.name, kind, "event dropped: subscriber queue full")
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(subscriber = lane.name, kind, "event dropped: subscriber worker closed")
                }
            }
        }
    }
}

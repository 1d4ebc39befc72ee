use async_trait::async_trait;
use yuki_core::Subscribe;
use yuki_model::Payload;

use crate::subscriber::view::log_payload;

/// Subscriber that writes every lifecycle event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLog;

impl EventLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for EventLog {
    async fn on_event(&self, event: &Payload) {
        log_payload(event);
    }

    fn name(&self) -> &'static str {
        "event-log"
    }

    fn queue_capacity(&self) -> usize {
        2048
    }
}

mod event_log;
mod view;

pub use event_log::EventLog;
pub use view::{log_payload, message_for};

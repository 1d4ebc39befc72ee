use tracing::{info, warn};
use yuki_model::{EventKind, Payload};

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::SyncStart => "sync started",
        EventKind::SyncEnd => "sync finished",
    }
}

/// Log a lifecycle event; a non-zero exit code is logged as a warning.
pub fn log_payload(p: &Payload) {
    let msg = message_for(p.kind);
    let name = p.name().unwrap_or("unknown");

    match p.kind {
        EventKind::SyncStart => info!(target: "yuki.events", name, "{msg}"),
        EventKind::SyncEnd => {
            let id = p.id().unwrap_or("unknown");
            let dir = p.dir().unwrap_or("unknown");
            match p.exit_code() {
                Some(0) => info!(target: "yuki.events", name, id, dir, exit_code = 0, "{msg}"),
                Some(code) => warn!(target: "yuki.events", name, id, dir, exit_code = code, "{msg} with failure"),
                None => warn!(target: "yuki.events", name, id, dir, "{msg} without exit code"),
            }
        }
    }
}

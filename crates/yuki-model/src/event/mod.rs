use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle event kinds emitted for sync containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The waiter is about to block on a container.
    SyncStart,
    /// A container exited and its exit code is known.
    SyncEnd,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SyncStart => "SyncStart",
            EventKind::SyncEnd => "SyncEnd",
        }
    }
}

/// Event payload handed to the event sink.
///
/// Attribute keys follow the kind: `SyncStart` carries `Name`; `SyncEnd` carries `ID`, `Name`, `Dir` and `ExitCode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub kind: EventKind,
    pub attrs: BTreeMap<String, Value>,
}

impl Payload {
    pub const ATTR_ID: &'static str = "ID";
    pub const ATTR_NAME: &'static str = "Name";
    pub const ATTR_DIR: &'static str = "Dir";
    pub const ATTR_EXIT_CODE: &'static str = "ExitCode";

    pub fn sync_start(name: impl Into<String>) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(Self::ATTR_NAME.to_string(), Value::String(name.into()));
        Self {
            kind: EventKind::SyncStart,
            attrs,
        }
    }

    pub fn sync_end(
        id: impl Into<String>,
        name: impl Into<String>,
        dir: impl Into<String>,
        exit_code: i64,
    ) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(Self::ATTR_ID.to_string(), Value::String(id.into()));
        attrs.insert(Self::ATTR_NAME.to_string(), Value::String(name.into()));
        attrs.insert(Self::ATTR_DIR.to_string(), Value::String(dir.into()));
        attrs.insert(Self::ATTR_EXIT_CODE.to_string(), Value::from(exit_code));
        Self {
            kind: EventKind::SyncEnd,
            attrs,
        }
    }

    /// String attribute, if present and a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.attr_str(Self::ATTR_NAME)
    }

    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.attr_str(Self::ATTR_ID)
    }

    #[inline]
    pub fn dir(&self) -> Option<&str> {
        self.attr_str(Self::ATTR_DIR)
    }

    #[inline]
    pub fn exit_code(&self) -> Option<i64> {
        self.attrs.get(Self::ATTR_EXIT_CODE).and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_start_carries_name_only() {
        let p = Payload::sync_start("debian");
        assert_eq!(p.kind, EventKind::SyncStart);
        assert_eq!(p.name(), Some("debian"));
        assert_eq!(p.attrs.len(), 1);
    }

    #[test]
    fn sync_end_attrs() {
        let p = Payload::sync_end("c0ffee", "debian", "/srv/debian", 25);
        assert_eq!(p.kind, EventKind::SyncEnd);
        assert_eq!(p.id(), Some("c0ffee"));
        assert_eq!(p.dir(), Some("/srv/debian"));
        assert_eq!(p.exit_code(), Some(25));
    }

    #[test]
    fn serializes_with_capitalized_attr_keys() {
        let p = Payload::sync_end("id", "n", "d", 0);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains(r#""kind":"SyncEnd""#));
        assert!(json.contains(r#""ExitCode":0"#));
    }
}

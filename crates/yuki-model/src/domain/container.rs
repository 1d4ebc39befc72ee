use serde::{Deserialize, Serialize};

use crate::{ContainerId, LABEL_NAME, LABEL_STORAGE_DIR, Labels};

/// A launched or rediscovered sync job instance.
///
/// Labels are the only metadata that survives a daemon restart, so everything the waiter needs must be
/// readable from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    #[serde(default)]
    pub labels: Labels,
}

impl Container {
    pub fn new(id: impl Into<ContainerId>, labels: Labels) -> Self {
        Self {
            id: id.into(),
            labels,
        }
    }

    #[inline]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Repository name recorded on the container.
    #[inline]
    pub fn repo_name(&self) -> Option<&str> {
        self.label(LABEL_NAME)
    }

    /// Storage directory recorded on the container.
    #[inline]
    pub fn storage_dir(&self) -> Option<&str> {
        self.label(LABEL_STORAGE_DIR)
    }
}

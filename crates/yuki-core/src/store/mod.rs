//! Repository configuration lookup.

mod memory;
pub use memory::MemoryStore;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;
use yuki_model::Repository;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("store backend: {0}")]
    Backend(String),
}

/// Read access to the repository configuration store.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Repository, StoreError>;

    /// Distinct `image` values across all repositories.
    async fn distinct_images(&self) -> Result<BTreeSet<String>, StoreError>;
}

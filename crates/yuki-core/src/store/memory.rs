use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use yuki_model::Repository;

use crate::store::{RepositoryStore, StoreError};

/// In-memory repository store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Repository>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repositories(repos: impl IntoIterator<Item = Repository>) -> Self {
        let store = Self::new();
        for repo in repos {
            store.insert(repo);
        }
        store
    }

    /// Insert or replace a repository, keyed by its name.
    pub fn insert(&self, repo: Repository) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(repo.name.clone(), repo);
    }

    pub fn remove(&self, name: &str) -> Option<Repository> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.remove(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RepositoryStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Repository, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn distinct_images(&self) -> Result<BTreeSet<String>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.values().map(|r| r.image.clone()).collect())
    }
}

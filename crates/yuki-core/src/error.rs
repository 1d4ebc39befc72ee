use std::path::PathBuf;

use thiserror::Error;

use crate::{runtime::RuntimeError, store::StoreError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("cannot find <{0}> in the repository store")]
    RepositoryNotFound(String),

    #[error("repository store failed: {0}")]
    Store(String),

    #[error("cannot create directory {path}: {reason}")]
    Filesystem { path: PathBuf, reason: String },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("missing label: {0}")]
    MissingLabel(&'static str),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("runtime: {0}")]
    Runtime(#[from] RuntimeError),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(name) => CoreError::RepositoryNotFound(name),
            other => CoreError::Store(other.to_string()),
        }
    }
}

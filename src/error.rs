use std::path::PathBuf;

use thiserror::Error;

/// Problems with user-supplied text, caught before any lookup or mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("search keyword cannot be empty")]
    EmptyKeyword,
    #[error("invalid task id: {0:?}")]
    InvalidId(String),
    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),
    #[error("unknown status: {0:?}")]
    UnknownStatus(String),
}

/// Errors returned by [`crate::task_store::TaskStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed task data in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no task ids left to assign")]
    IdsExhausted,
    #[error("task {0} not found")]
    NotFound(u32),
    #[error(transparent)]
    Input(#[from] InputError),
}

pub type StoreResult<T> = Result<T, StoreError>;

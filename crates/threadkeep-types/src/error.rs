use thiserror::Error;

/// Errors from a thread's message store.
///
/// An untouched thread is not an error: it reads back as an empty sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadStoreError {
    #[error("message id '{0}' already exists in this thread")]
    DuplicateId(String),

    #[error("corrupt record for message '{id}': {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Errors from repository operations on the relational ownership store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

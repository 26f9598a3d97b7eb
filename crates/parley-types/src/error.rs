use thiserror::Error;

use crate::llm::LlmError;

/// Errors from session store operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Failure categories of the chat operations.
///
/// Each variant maps to one stable category at the HTTP edge; the inner
/// detail is for logs only.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Bad or missing input. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// An explicit lookup of something that must exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The model provider failed or returned malformed output.
    #[error("upstream error: {0}")]
    Upstream(#[from] LlmError),

    /// The session store was unreachable or rejected the write.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

impl ChatError {
    /// Machine-readable category code.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "VALIDATION_ERROR",
            ChatError::NotFound(_) => "NOT_FOUND",
            ChatError::Upstream(_) => "UPSTREAM_ERROR",
            ChatError::Store(_) => "STORE_ERROR",
        }
    }
}

//! Error types for filevault.

use thiserror::Error;

/// Common error type for filevault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Session cache error (backend unreachable or returned garbage).
    #[error("cache error: {0}")]
    Cache(String),

    /// Artifact queue error.
    #[error("queue error: {0}")]
    Queue(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Duplicate unique key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found, or hidden from the requester.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Server-side failure outside the backing stores, such as password hashing.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Whether this error comes from a backing store rather than the caller.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            VaultError::Database(_)
                | VaultError::Cache(_)
                | VaultError::Queue(_)
                | VaultError::Io(_)
                | VaultError::Config(_)
                | VaultError::Internal(_)
        )
    }
}

impl From<sqlx::Error> for VaultError {
    fn from(e: sqlx::Error) -> Self {
        VaultError::Database(e.to_string())
    }
}

/// Result type alias for filevault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

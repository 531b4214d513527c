//! Error handling for sqlrepo-store
//!
//! Wraps sqlrepo-core RepoError with store-specific helpers

use sqlrepo_core::errors::{RepoError, RepoErrorKind};

/// Result type alias using RepoError
pub type Result<T> = std::result::Result<T, RepoError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> RepoError {
    RepoError::new(RepoErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> RepoError {
    RepoError::new(RepoErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a layout mismatch error for a registered table
pub fn schema_mismatch(table: &str, expected: &str, actual: &str) -> RepoError {
    RepoError::new(RepoErrorKind::SchemaMismatch)
        .with_op("ensure_table")
        .with_entity(table)
        .with_message(format!(
            "Table {} is registered with layout {}, requested {}",
            table, expected, actual
        ))
}

/// Create an error for an operation issued after `close`
pub fn store_closed(operation: &str) -> RepoError {
    RepoError::new(RepoErrorKind::StoreClosed)
        .with_op(operation.to_string())
        .with_message("store is closed")
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> RepoError {
    RepoError::new(RepoErrorKind::InvalidInput)
        .with_op("config")
        .with_message(reason)
}

/// Create an error for a stored cell that does not fit its field kind
pub fn decode_error(table: &str, field: &str, reason: impl Into<String>) -> RepoError {
    RepoError::new(RepoErrorKind::Serialization)
        .with_op("decode_row")
        .with_entity(table)
        .with_field(field)
        .with_message(reason)
}

/// Create an error for a blocking task that panicked or was cancelled
pub fn task_error(operation: &str, err: tokio::task::JoinError) -> RepoError {
    RepoError::new(RepoErrorKind::Internal)
        .with_op(operation.to_string())
        .with_message(format!("blocking task failed: {}", err))
}

/// Create an error for a poisoned connection lock
pub fn lock_poisoned(operation: &str) -> RepoError {
    RepoError::new(RepoErrorKind::Concurrency)
        .with_op(operation.to_string())
        .with_message("connection lock poisoned")
}

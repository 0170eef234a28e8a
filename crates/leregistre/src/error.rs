//! Storage error types.

use lemoteur::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur when working with the register.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Requested ID
        id: i64,
    },

    /// Unique, foreign key or check constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Input failed validation
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Seeding refused because catalog entries already exist
    #[error("Catalog already seeded: {0} course(s) already exist")]
    AlreadySeeded(usize),
}

impl StorageError {
    /// Single-message validation error
    pub fn invalid(message: impl Into<String>) -> Self {
        StorageError::Validation(vec![message.into()])
    }

    /// Not-found error for a record kind
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StorageError::NotFound { entity, id }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                StorageError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            _ => StorageError::Database(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            StorageError::ConstraintViolation(message) => StoreError::ConstraintViolation(message),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

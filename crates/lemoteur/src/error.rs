//! Engine error types.
//!
//! Store implementations report [`StoreError`]; the generator surfaces them
//! as [`EngineError`] without retrying.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type for record store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by a [`crate::RecordStore`] implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record ("user", "course", "recommendation")
        entity: &'static str,
        /// Requested ID
        id: i64,
    },

    /// A uniqueness, foreign key or check constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Profile, program or recommendation ID did not resolve
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Requested ID
        id: i64,
    },

    /// The profile exists but qualifies for no program
    #[error("No eligible courses found for user {profile_id}")]
    NoEligiblePrograms {
        /// Profile the generation was run for
        profile_id: i64,
    },

    /// A store constraint rejected a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A batch write failed; nothing from the batch was kept
    #[error("Failed to write batch of {attempted} recommendations: {source}")]
    BatchFailure {
        /// Number of recommendations in the batch
        attempted: usize,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// A value was outside its domain
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Backend failure reported by the store
    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            StoreError::ConstraintViolation(message) => EngineError::ConstraintViolation(message),
            StoreError::Backend(message) => EngineError::Store(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_engine_not_found() {
        let err: EngineError = StoreError::NotFound { entity: "user", id: 7 }.into();
        assert_eq!(err, EngineError::NotFound { entity: "user", id: 7 });
        assert_eq!(err.to_string(), "user not found: 7");
    }

    #[test]
    fn test_batch_failure_display_includes_source() {
        let err = EngineError::BatchFailure {
            attempted: 3,
            source: StoreError::Backend("disk I/O error".to_string()),
        };
        let display = err.to_string();
        assert!(display.contains("3 recommendations"));
        assert!(display.contains("disk I/O error"));
    }
}

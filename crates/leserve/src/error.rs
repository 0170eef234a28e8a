//! API error types

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lemoteur::EngineError;
use leregistre::StorageError;
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Machine-readable error code carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request (bad path parameter)
    BadRequest,
    /// Input failed validation
    ValidationError,
    /// Record does not exist
    NotFound,
    /// Generation found no qualifying course
    NoEligiblePrograms,
    /// Unique or reference constraint rejected the write
    Conflict,
    /// Storage or generation failure
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound | ErrorCode::NoEligiblePrograms => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire form, e.g. `NO_ELIGIBLE_PROGRAMS`
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::NoEligiblePrograms => "NO_ELIGIBLE_PROGRAMS",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Error returned by a handler, rendered as
/// `{"success": false, "error": <message>, "code": <code>}`
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,

    /// Error message
    pub message: String,

    /// Error code for client handling
    pub code: ErrorCode,
}

impl ApiError {
    /// Error with the status implied by `code`
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status(),
            message: message.into(),
            code,
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// 409 Conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// 422 Unprocessable Entity
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
            "code": self.code,
        }));

        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation(_) => Self::validation(err.to_string()),
            StorageError::NotFound { .. } => Self::not_found(err.to_string()),
            StorageError::ConstraintViolation(_) | StorageError::AlreadySeeded(_) => {
                Self::conflict(err.to_string())
            }
            StorageError::Database(_) => {
                error!("Storage failure: {}", err);
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { .. } => Self::not_found(err.to_string()),
            EngineError::NoEligiblePrograms { .. } => {
                Self::new(ErrorCode::NoEligiblePrograms, err.to_string())
            }
            EngineError::InvalidValue(_) => Self::validation(err.to_string()),
            EngineError::ConstraintViolation(_) => Self::conflict(err.to_string()),
            EngineError::BatchFailure { .. } | EngineError::Store(_) => {
                error!("Generation failed: {}", err);
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemoteur::StoreError;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::BadRequest, 400)]
    #[case(ErrorCode::ValidationError, 422)]
    #[case(ErrorCode::NotFound, 404)]
    #[case(ErrorCode::NoEligiblePrograms, 404)]
    #[case(ErrorCode::Conflict, 409)]
    #[case(ErrorCode::InternalError, 500)]
    fn test_code_status(#[case] code: ErrorCode, #[case] status: u16) {
        assert_eq!(code.status().as_u16(), status);
        assert_eq!(
            serde_json::to_value(code).unwrap(),
            serde_json::Value::from(code.as_str())
        );
    }

    #[test]
    fn test_storage_errors_map_to_status() {
        let cases = [
            (StorageError::invalid("email is required"), ErrorCode::ValidationError),
            (StorageError::not_found("course", 3), ErrorCode::NotFound),
            (
                StorageError::ConstraintViolation("UNIQUE constraint failed: users.email".into()),
                ErrorCode::Conflict,
            ),
            (StorageError::AlreadySeeded(4), ErrorCode::Conflict),
        ];
        for (err, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.code, code);
            assert_eq!(api.status, code.status());
        }
    }

    #[test]
    fn test_engine_errors_map_to_status() {
        let no_programs = ApiError::from(EngineError::NoEligiblePrograms { profile_id: 9 });
        assert_eq!(no_programs.status, StatusCode::NOT_FOUND);
        assert_eq!(no_programs.code, ErrorCode::NoEligiblePrograms);
        assert!(no_programs.message.contains("No eligible courses"));

        let missing = ApiError::from(EngineError::NotFound { entity: "user", id: 9 });
        assert_eq!(missing.code, ErrorCode::NotFound);
        assert_eq!(missing.to_string(), "[NOT_FOUND] user not found: 9");

        let batch = ApiError::from(EngineError::BatchFailure {
            attempted: 3,
            source: StoreError::Backend("disk full".into()),
        });
        assert_eq!(batch.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_body_envelope() {
        let response = ApiError::conflict("Email already exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": "Email already exists",
                "code": "CONFLICT",
            })
        );
    }
}

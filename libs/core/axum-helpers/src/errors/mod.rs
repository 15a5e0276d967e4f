pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Standard error response structure.
///
/// This structure is returned for all error responses, providing consistent
/// error information to clients including
/// - `code`: Integer error code for logging/monitoring (e.g., 1008)
/// - `error`: Machine-readable error identifier (e.g., "CONFLICT")
/// - `message`: Human-readable error message
/// - `details`: Optional additional error details (e.g., validation errors)
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "Email already registered"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details (e.g., validation field errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    /// Request field name as the client sent it
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error type that can be converted to HTTP responses.
///
/// Server-side variants log their detail and answer with the generic message
/// of their [`ErrorCode`]; client-side variants echo their message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query extraction error: {0}")]
    QueryExtractorRejection(#[from] QueryRejection),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JsonExtractorRejection(_)
            | AppError::QueryExtractorRejection(_)
            | AppError::Validation(_)
            | AppError::InvalidId(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::JsonExtractorRejection(_) => ErrorCode::JsonExtraction,
            AppError::QueryExtractorRejection(_) => ErrorCode::InvalidQuery,
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::InvalidId(_) => ErrorCode::InvalidId,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Database(_) => ErrorCode::DatabaseError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.error_code();

        let (message, details) = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error_code = code.code(), "JSON extraction error: {:?}", e);
                (e.body_text(), None)
            }
            AppError::QueryExtractorRejection(e) => {
                tracing::warn!(error_code = code.code(), "Query extraction error: {:?}", e);
                (e.body_text(), None)
            }
            AppError::Validation(violations) => {
                tracing::info!(
                    error_code = code.code(),
                    fields = violations.len(),
                    "Validation error: {:?}",
                    violations
                );
                (
                    code.default_message().to_string(),
                    serde_json::to_value(&violations).ok(),
                )
            }
            AppError::InvalidId(id) => {
                tracing::info!(error_code = code.code(), "Invalid ID: {}", id);
                (code.default_message().to_string(), None)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = code.code(), "Not found: {}", msg);
                (msg, None)
            }
            AppError::Conflict(msg) => {
                tracing::info!(error_code = code.code(), "Conflict: {}", msg);
                (msg, None)
            }
            AppError::Database(msg) => {
                tracing::error!(error_code = code.code(), "Database error: {}", msg);
                (code.default_message().to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            code: code.code(),
            error: code.as_str().to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Build an error body outside of [`AppError`], e.g. for fallbacks and
/// panic responses.
pub fn error_response_with_details(
    status: StatusCode,
    message: String,
    error_code: ErrorCode,
    details: Option<serde_json::Value>,
) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        message,
        details,
    });

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_every_field() {
        let err = AppError::Validation(vec![
            FieldViolation::new("age", "Age is required"),
            FieldViolation::new("name", "Name is required"),
        ]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body.code, 1001);
        assert_eq!(body.error, "VALIDATION_ERROR");
        let details = body.details.unwrap();
        assert_eq!(details.as_array().unwrap().len(), 2);
        assert_eq!(details[0]["field"], "age");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response =
            AppError::Database("connection reset by peer at 10.0.0.3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.error, "DATABASE_ERROR");
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_invalid_id_message() {
        let response = AppError::InvalidId("invalid123".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(response).await;
        assert_eq!(body.message, "Invalid ID format");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn test_conflict_echoes_message() {
        let response = AppError::Conflict("Email already registered".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_of(response).await.message, "Email already registered");
    }
}

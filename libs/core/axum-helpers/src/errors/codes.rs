//! Type-safe error codes for API responses.
//!
//! Each error code has:
//! - a string identifier for clients (e.g. "VALIDATION_ERROR")
//! - an integer code for logs and monitoring (e.g. 1001)
//! - a default human-readable message
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Validation failed");
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// One or more request fields violate their constraints
    ValidationError,

    /// Path identifier is not a valid ObjectId
    InvalidId,

    /// Request body could not be parsed as the expected JSON
    JsonExtraction,

    /// Query string could not be parsed
    InvalidQuery,

    /// Requested resource was not found
    NotFound,

    /// No route matches the request
    RouteNotFound,

    /// Request conflicts with an existing resource
    Conflict,

    // Server errors
    /// A handler panicked and was caught by the last-resort layer
    UnhandledPanic,

    // Database errors (2000-2999)
    /// Persistence layer failure
    DatabaseError,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE identifier for programmatic handling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidId => "INVALID_ID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::NotFound => "NOT_FOUND",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::UnhandledPanic => "UNHANDLED_PANIC",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// Integer code for structured logs and metrics.
    ///
    /// - 1000-1999: client and generic server errors
    /// - 2000-2999: database errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidId => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Conflict => 1008,
            Self::InvalidQuery => 1012,
            Self::RouteNotFound => 1013,
            Self::UnhandledPanic => 1099,
            Self::DatabaseError => 2003,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Validation failed",
            Self::InvalidId => "Invalid ID format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::InvalidQuery => "Invalid query parameters",
            Self::NotFound => "Resource not found",
            Self::RouteNotFound => "Endpoint not found",
            Self::Conflict => "Resource already exists",
            Self::UnhandledPanic => "Something went wrong",
            Self::DatabaseError => "A database error occurred",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

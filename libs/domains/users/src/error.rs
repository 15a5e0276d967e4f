use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldViolation};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldViolation>),

    #[error("Email already registered")]
    EmailTaken,

    #[error("No user found with ID: {0}")]
    NotFound(ObjectId),

    #[error("Database error: {0}")]
    Database(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(violations) => AppError::Validation(violations),
            UserError::EmailTaken => AppError::Conflict("Email already registered".to_string()),
            UserError::NotFound(id) => AppError::NotFound(format!("No user found with ID: {}", id)),
            UserError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Database(err.to_string())
    }
}

impl From<Vec<FieldViolation>> for UserError {
    fn from(violations: Vec<FieldViolation>) -> Self {
        UserError::Validation(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_not_found_message_echoes_id() {
        let id = ObjectId::parse_str("665f1c2e9b1d4a0012345678").unwrap();
        assert_eq!(
            UserError::NotFound(id).to_string(),
            "No user found with ID: 665f1c2e9b1d4a0012345678"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (UserError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (UserError::EmailTaken, StatusCode::CONFLICT),
            (UserError::NotFound(ObjectId::new()), StatusCode::NOT_FOUND),
            (
                UserError::Database("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}

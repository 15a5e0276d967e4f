//! ObjectId path parameter extractor with automatic validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;

/// Extractor for MongoDB ObjectId path parameters.
///
/// Parses the 24-character hex id from the path, rejecting anything else
/// with `400 Invalid ID format`.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::extractors::ObjectIdPath;
///
/// async fn get_user(ObjectIdPath(id): ObjectIdPath) -> String {
///     format!("User ID: {}", id.to_hex())
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
pub struct ObjectIdPath(pub ObjectId);

impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        match ObjectId::parse_str(&id) {
            Ok(oid) => Ok(ObjectIdPath(oid)),
            Err(_) => Err(AppError::InvalidId(id).into_response()),
        }
    }
}

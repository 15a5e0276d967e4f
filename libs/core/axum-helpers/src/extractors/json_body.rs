//! JSON body extractor reporting parse failures in the standard error envelope.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// JSON extractor whose rejection is an [`AppError::JsonExtractorRejection`].
///
/// Field-level validation is left to the service layer, which sees the
/// whole candidate record.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::JsonBody;
///
/// async fn create_user(JsonBody(payload): JsonBody<CreateUser>) -> String {
///     format!("Creating user: {:?}", payload.name)
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(JsonBody(data))
    }
}

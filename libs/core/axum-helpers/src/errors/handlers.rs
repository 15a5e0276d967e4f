use std::any::Any;

use axum::{
    http::{Method, StatusCode, Uri},
    response::Response,
};
use serde_json::json;

use super::{ErrorCode, error_response_with_details};

/// Fallback for unmatched routes.
///
/// Answers 404 with `Cannot <METHOD> <path>` and the list of endpoints the
/// service exposes under `details.availableEndpoints`.
pub fn route_not_found(method: &Method, uri: &Uri, endpoints: &[&str]) -> Response {
    tracing::debug!(%method, %uri, "No route matched");

    error_response_with_details(
        StatusCode::NOT_FOUND,
        format!("Cannot {} {}", method, uri.path()),
        ErrorCode::RouteNotFound,
        Some(json!({ "availableEndpoints": endpoints })),
    )
}

/// Build the responder used by `CatchPanicLayer`.
///
/// The panic payload is only echoed back when `expose_details` is set
/// (development mode). It is always logged.
pub fn panic_responder(
    expose_details: bool,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |payload: Box<dyn Any + Send + 'static>| {
        let detail = panic_message(payload.as_ref());
        tracing::error!(
            error_code = ErrorCode::UnhandledPanic.code(),
            panic = %detail,
            "Request handler panicked"
        );

        let details = expose_details.then(|| json!({ "panic": detail }));
        error_response_with_details(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::UnhandledPanic.default_message().to_string(),
            ErrorCode::UnhandledPanic,
            details,
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_route_not_found_lists_endpoints() {
        let uri: Uri = "/nope?x=1".parse().unwrap();
        let response = route_not_found(&Method::PATCH, &uri, &["GET /", "GET /health"]);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert_eq!(body["message"], "Cannot PATCH /nope");
        assert_eq!(body["error"], "ROUTE_NOT_FOUND");
        assert_eq!(body["details"]["availableEndpoints"][1], "GET /health");
    }

    #[tokio::test]
    async fn test_panic_responder_hides_details_in_production() {
        let respond = panic_responder(false);
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let body = json_body(respond(payload)).await;
        assert_eq!(body["code"], 1099);
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_panic_responder_exposes_details_in_development() {
        let respond = panic_responder(true);
        let payload: Box<dyn Any + Send> = Box::new(String::from("index out of bounds"));
        let response = respond(payload);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["details"]["panic"], "index out of bounds");
    }
}

//! Liveness endpoint

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    status: &'static str,
    timestamp: DateTime<Utc>,
    /// `connected` or `disconnected`
    #[schema(example = "connected")]
    database: &'static str,
    /// Seconds since startup
    uptime: f64,
}

/// Create a health check router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

/// Liveness check with database connectivity
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = database::mongodb::check_health(&state.mongo_client).await;

    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        database: super::root::connection_label(connected),
        uptime: state.runtime.uptime_secs(),
    })
}

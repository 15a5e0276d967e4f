//! Service banner

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    users: &'static str,
    health: &'static str,
    deep_health: &'static str,
    stats: &'static str,
    docs: &'static str,
}

const ENDPOINTS: Endpoints = Endpoints {
    users: "/users",
    health: "/health",
    deep_health: "/users/health/status",
    stats: "/users/stats/summary",
    docs: "/swagger-ui",
};

#[derive(Serialize, ToSchema)]
pub struct BannerResponse {
    #[schema(example = "User API is running")]
    message: &'static str,
    #[schema(example = "1.0.0")]
    version: String,
    #[schema(example = "connected")]
    database: &'static str,
    endpoints: Endpoints,
}

pub(crate) fn connection_label(connected: bool) -> &'static str {
    if connected { "connected" } else { "disconnected" }
}

/// Create the banner router
pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(banner)).with_state(state)
}

/// Service name, version and entry points
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service banner", body = BannerResponse)
    )
)]
pub async fn banner(State(state): State<AppState>) -> Json<BannerResponse> {
    let connected = database::mongodb::check_health(&state.mongo_client).await;

    Json(BannerResponse {
        message: "User API is running",
        version: state.runtime.version.clone(),
        database: connection_label(connected),
        endpoints: ENDPOINTS,
    })
}

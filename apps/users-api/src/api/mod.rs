//! API routes module
//!
//! This module defines all HTTP API routes of the users API.

pub mod health;
pub mod root;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Routes listed by the 404 fallback
pub const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /users",
    "POST /users",
    "GET /users/{id}",
    "PUT /users/{id}",
    "DELETE /users/{id}",
    "GET /users/health/status",
    "GET /users/stats/summary",
    "GET /swagger-ui",
    "GET /api-docs/openapi.json",
];

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/users", users::router(state))
        .merge(root::router(state.clone()))
        .merge(health::router(state.clone()))
}

//! OpenAPI documentation configuration

use utoipa::OpenApi;

use crate::api::{health, root};

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User API",
        version = "1.0.0",
        description = "MongoDB-backed REST API for managing users"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(root::banner, health::health_check),
    components(schemas(root::BannerResponse, root::Endpoints, health::HealthResponse)),
    nest(
        (path = "/users", api = domain_users::ApiDoc)
    ),
    tags(
        (name = "Health", description = "Liveness and service information"),
        (name = "Users", description = "User management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

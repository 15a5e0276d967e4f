//! Server infrastructure module.
//!
//! This module provides:
//! - Router assembly with OpenAPI documentation and common layers
//! - Graceful shutdown coordination
//! - Runtime facts (uptime, memory) for health endpoints
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router};
//!
//! let router = create_router::<ApiDoc>(api_routes, &server_config, &environment, ENDPOINTS)?;
//! create_production_app(router, &server_config, Duration::from_secs(30), async {}).await?;
//! ```

pub mod app;
pub mod runtime;
pub mod shutdown;

pub use app::{OPENAPI_JSON_PATH, cors_layer, create_production_app, create_router};
pub use runtime::{ProcessMemory, RuntimeInfo};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};

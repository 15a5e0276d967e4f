//! # Axum Helpers
//!
//! Utilities shared by the HTTP services of the workspace.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, graceful shutdown, runtime metrics
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: Custom extractors (ObjectId path, JSON body, query string)
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_production_app, create_router};
//! use core_config::{Environment, server::ServerConfig};
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let router = create_router::<ApiDoc>(Router::new(), &config, &Environment::Development, &[])?;
//!     create_production_app(router, &config, std::time::Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod server;

// Re-export server types
pub use server::{
    ProcessMemory, RuntimeInfo, ShutdownCoordinator, create_production_app, create_router,
    shutdown_signal,
};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse, FieldViolation};

// Re-export extractors
pub use extractors::{JsonBody, ObjectIdPath, QueryParams};

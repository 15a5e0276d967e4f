//! Application state management.
//!
//! Shared state passed to the app-level handlers (banner and liveness).

use axum_helpers::RuntimeInfo;
use mongodb::{Client, Database};

/// Shared application state.
///
/// Cloned for each handler; the MongoDB handles share one connection pool.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
    /// Version, environment and uptime of the process
    pub runtime: RuntimeInfo,
}

use axum_helpers::{RuntimeInfo, create_production_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    // Connect to MongoDB with retry
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;

    // Get the database
    let db = mongo_client.database(config.mongodb.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    let runtime = RuntimeInfo::new(config.api_version.clone(), config.environment.clone());

    // Initialize the application state
    let state = AppState {
        config,
        mongo_client,
        db,
        runtime,
    };

    // Initialize indexes
    api::users::init_indexes(&state).await?;

    // Build router with API routes
    let api_routes = api::routes(&state);

    // Create a router with OpenAPI docs, fallback and middleware
    let app = create_router::<openapi::ApiDoc>(
        api_routes,
        &state.config.server,
        &state.config.environment,
        api::ENDPOINTS,
    )
    .map_err(|e| eyre::eyre!("Router setup failed: {}", e))?;

    info!(
        version = %state.runtime.version,
        environment = state.runtime.environment.as_str(),
        "Starting User API with production-ready shutdown (30s timeout)"
    );

    let mongo_client = state.mongo_client.clone();

    // Production-ready server with graceful shutdown
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing MongoDB connections");
            mongo_client.shutdown().await;
            info!("MongoDB connection closed successfully");
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("User API shutdown complete");
    Ok(())
}

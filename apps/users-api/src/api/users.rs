//! Users API routes
//!
//! This module wires up the users domain to HTTP routes.

use axum::Router;
use domain_users::{MongoUserRepository, UserService, handlers};

use crate::state::AppState;

/// Create users router
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoUserRepository::new(state.db.clone());

    // Create the service
    let service = UserService::new(repository);

    // Return the domain's router
    handlers::router(service, state.runtime.clone())
}

/// Create the indexes the users collection relies on
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    MongoUserRepository::new(state.db.clone())
        .init_indexes()
        .await?;
    Ok(())
}

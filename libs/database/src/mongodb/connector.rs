use mongodb::{Client, options::ClientOptions};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};

/// Connect using a MongoDB config and verify the server answers a ping.
///
/// Driver-level retryable reads and writes are disabled: callers see the first
/// failure of every operation.
///
/// # Example
/// ```ignore
/// use database::mongodb::{MongoConfig, connect_from_config};
///
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "users_api");
/// let client = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(config: &MongoConfig) -> DatabaseResult<Client> {
    info!("Attempting to connect to MongoDB at {}", config.redacted_url());

    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
    options.server_selection_timeout =
        Some(Duration::from_millis(config.server_selection_timeout_ms));
    options.retry_reads = Some(false);
    options.retry_writes = Some(false);

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;

    client
        .database(config.database())
        .run_command(mongodb::bson::doc! { "ping": 1 })
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(
        database = config.database(),
        max_pool_size = config.max_pool_size,
        "Successfully connected to MongoDB"
    );
    Ok(client)
}

/// Connect to a bare connection string with the default pool settings.
pub async fn connect(url: &str) -> DatabaseResult<Client> {
    connect_from_config(&MongoConfig::new(url)).await
}

/// Connect from config, retrying with exponential backoff on failure.
///
/// Useful when the database container starts alongside the service.
///
/// # Example
/// ```ignore
/// use database::mongodb::{MongoConfig, connect_from_config_with_retry};
/// use database::common::RetryConfig;
///
/// let config = MongoConfig::from_env()?;
/// let client = connect_from_config_with_retry(&config, Some(RetryConfig::new().with_max_retries(5))).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    retry_config: Option<RetryConfig>,
) -> DatabaseResult<Client> {
    match retry_config {
        Some(policy) => retry_with_backoff(|| connect_from_config(config), policy).await,
        None => retry(|| connect_from_config(config)).await,
    }
}

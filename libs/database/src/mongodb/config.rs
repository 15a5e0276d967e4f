#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_first, env_parse_or};

pub const DEFAULT_URL: &str = "mongodb://localhost:27017/users_api";
pub const DEFAULT_DATABASE: &str = "users_api";
pub const DEFAULT_MAX_POOL_SIZE: u32 = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// MongoDB connection settings
///
/// # Example
///
/// ```ignore
/// use database::mongodb::MongoConfig;
///
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "users_api")
///     .with_pool_size(20, 2);
///
/// // From environment variables (requires `config` feature)
/// let config = MongoConfig::from_env()?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Connection string: mongodb://[username:password@]host[:port][/database][?options]
    pub url: String,

    /// Database name to use
    pub database: String,

    /// Optional application name for server logs
    pub app_name: Option<String>,

    /// Maximum number of connections in the pool
    pub max_pool_size: u32,

    /// Minimum number of connections in the pool
    pub min_pool_size: u32,

    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Server selection timeout in milliseconds
    pub server_selection_timeout_ms: u64,
}

impl MongoConfig {
    /// Config for `url`, taking the database from the URL path when present.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let database = database_from_url(&url).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        Self::with_database(url, database)
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            app_name: None,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            min_pool_size: 0,
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            server_selection_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_pool_size(mut self, max_pool_size: u32, min_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self.min_pool_size = min_pool_size.min(max_pool_size);
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL with any `user:password@` credentials masked, for logging.
    pub fn redacted_url(&self) -> String {
        redact_credentials(&self.url)
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

/// Database name from the path segment of a connection string, if any.
pub fn database_from_url(url: &str) -> Option<String> {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (_, path) = after_scheme.split_once('/')?;
    let name = path.split('?').next().unwrap_or_default().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn redact_credentials(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_, host)) => format!("{}://***:***@{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

/// Load MongoConfig from environment variables
///
/// Environment variables (all optional):
/// - `MONGODB_URI`, `MONGODB_URL` or `MONGO_URL` - connection string
///   (default: `mongodb://localhost:27017/users_api`)
/// - `MONGODB_DATABASE` - database name (default: URL path, else `users_api`)
/// - `MONGODB_APP_NAME` - application name for server logs
/// - `DB_POOL_SIZE` (default: 10) - max pool connections
/// - `DB_MIN_POOL_SIZE` (default: 0) - min pool connections
/// - `DB_CONNECTION_TIMEOUT` (default: 30000) - connect / server selection timeout in ms
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = env_first(&["MONGODB_URI", "MONGODB_URL", "MONGO_URL"])
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        let database = env_first(&["MONGODB_DATABASE", "MONGO_DATABASE"])
            .or_else(|| database_from_url(&url))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let max_pool_size: u32 = env_parse_or("DB_POOL_SIZE", DEFAULT_MAX_POOL_SIZE)?;
        let min_pool_size: u32 = env_parse_or("DB_MIN_POOL_SIZE", 0)?;
        let timeout_ms: u64 = env_parse_or("DB_CONNECTION_TIMEOUT", DEFAULT_TIMEOUT_MS)?;

        if max_pool_size == 0 {
            return Err(ConfigError::ParseError {
                key: "DB_POOL_SIZE".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        let mut config = Self::with_database(url, database).with_pool_size(max_pool_size, min_pool_size);
        config.app_name = std::env::var("MONGODB_APP_NAME").ok();
        config.connect_timeout_ms = timeout_ms;
        config.server_selection_timeout_ms = timeout_ms;

        Ok(config)
    }
}

use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

const DEFAULT_API_VERSION: &str = "1.0.0";

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    /// Version reported by the banner and the health endpoints (`API_VERSION`)
    pub api_version: String,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            api_version: env_or_default("API_VERSION", DEFAULT_API_VERSION),
            mongodb,
            server,
            environment,
        })
    }
}

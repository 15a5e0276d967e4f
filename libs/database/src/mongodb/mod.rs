//! MongoDB connector and utilities
//!
//! Provides connection management and MongoDB-specific helpers.

mod config;
mod connector;
mod health;

pub use config::{MongoConfig, database_from_url};
pub use connector::{connect, connect_from_config, connect_from_config_with_retry};
pub use health::{check_health, ping};

//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Values use the `HUDDLE` prefix with
//! double underscores separating nested sections.
//!
//! # Example
//!
//! ```no_run
//! use huddle::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod rate_limit;
mod redis;
mod room;
mod server;

pub use error::{ConfigError, ValidationError};
pub use rate_limit::{RateLimitConfig, RouteBudget};
pub use redis::RedisConfig;
pub use room::RoomConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration; absent means in-memory single-process mode
    pub redis: Option<RedisConfig>,

    /// Session code shape and room creation behavior
    #[serde(default)]
    pub room: RoomConfig,

    /// Request budgets for guarded write paths
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `HUDDLE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `HUDDLE__REDIS__URL=redis://...` -> `redis.url = ...`
    /// - `HUDDLE__ROOM__CODE_LENGTH=4` -> `room.code_length = 4`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("HUDDLE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.room.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_without_redis() {
        let config = AppConfig::default();
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_redis_section_fails_validation() {
        let config = AppConfig {
            redis: Some(RedisConfig {
                url: "http://wrong".to_string(),
                timeout_secs: 5,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_room_section_fails_validation() {
        let config = AppConfig {
            room: RoomConfig {
                code_length: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeLength));
    }
}

//! Server configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `smartstock.toml` in the working directory, then environment variables
//! (plain names such as `PORT` or `JWT_SECRET`). `main` loads `.env` with
//! `dotenvy` before calling [`ServerConfig::load`].

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub database_max_connections: u32,

    /// Secret key for signing tokens. Required; there is no default.
    #[serde(default, skip_serializing)]
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub jwt_lifetime_secs: i64,
}

impl ServerConfig {
    /// Load configuration from `smartstock.toml` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::default())
    }

    /// Load configuration with an explicit environment source.
    pub fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let config: ServerConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("database_path", "smartstock.db")?
            .set_default("database_max_connections", 5)?
            .set_default("jwt_lifetime_secs", 86_400)?
            .add_source(File::with_name("smartstock").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `CLINIC_BOT` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use clinic_dialog::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod crm;
mod error;
mod interpreter;
mod redis;
mod rules;
mod server;

pub use crm::CrmConfig;
pub use error::{ConfigError, ValidationError};
pub use interpreter::InterpreterConfig;
pub use redis::RedisConfig;
pub use rules::RulesConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration (session and history storage)
    pub redis: RedisConfig,

    /// Booking CRM configuration
    pub crm: CrmConfig,

    /// Step interpreter configuration (optional LLM layer)
    #[serde(default)]
    pub interpreter: InterpreterConfig,

    /// Clinic rules source
    #[serde(default)]
    pub rules: RulesConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CLINIC_BOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CLINIC_BOT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CLINIC_BOT__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CLINIC_BOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.redis.validate()?;
        self.crm.validate()?;
        self.interpreter.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

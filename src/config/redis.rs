//! Redis configuration (session and history storage)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Session and history TTL in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get session TTL as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

// 6 hours, matching the conversation session lifetime.
fn default_session_ttl() -> u64 {
    21_600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_defaults() {
        let config = RedisConfig::default();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.session_ttl_secs, 21_600);
    }

    #[test]
    fn test_ttl_duration() {
        let config = RedisConfig {
            session_ttl_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.session_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_validation_missing_url() {
        let config = RedisConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let config = RedisConfig {
            url: "http://localhost:6379".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_redis_url() {
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_ttl() {
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            session_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

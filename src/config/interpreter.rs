//! Step interpreter (LLM) configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Step interpreter configuration
///
/// The interpreter is optional: when disabled the scenes rely entirely on
/// deterministic validation.
#[derive(Debug, Clone, Deserialize)]
pub struct InterpreterConfig {
    /// Whether the interpreter layer is active
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible chat completions base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key
    pub api_key: Option<Secret<String>>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl InterpreterConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate interpreter configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.api_key.is_none() {
            return Err(ValidationError::MissingRequired("INTERPRETER_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidInterpreterUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_validates() {
        assert!(InterpreterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_enabled_requires_api_key() {
        let config = InterpreterConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_with_key_validates() {
        let config = InterpreterConfig {
            enabled: true,
            api_key: Some(Secret::new("sk-xxx".to_string())),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_rejects_bad_url() {
        let config = InterpreterConfig {
            enabled: true,
            api_key: Some(Secret::new("sk-xxx".to_string())),
            base_url: "api.openai.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

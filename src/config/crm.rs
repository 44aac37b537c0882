//! Booking CRM configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Booking CRM client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
    /// CRM API base URL
    pub base_url: String,

    /// CRM API key
    pub api_key: Secret<String>,

    /// Default clinic identifier for bookings
    #[serde(default = "default_clinic_id")]
    pub clinic_id: u32,

    /// Request timeout in seconds (hard upper bound per call)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl CrmConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate CRM configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("CRM_BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidCrmUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_clinic_id() -> u32 {
    1
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> CrmConfig {
        CrmConfig {
            base_url: base_url.to_string(),
            api_key: Secret::new("key".to_string()),
            clinic_id: default_clinic_id(),
            timeout_secs: default_timeout(),
        }
    }

    #[test]
    fn test_validation_valid_url() {
        assert!(config("https://crm.example.com/api").validate().is_ok());
    }

    #[test]
    fn test_validation_missing_url() {
        assert!(config("").validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        assert!(config("crm.example.com").validate().is_err());
    }

    #[test]
    fn test_validation_timeout_bounds() {
        let mut cfg = config("https://crm.example.com");
        cfg.timeout_secs = 0;
        assert!(cfg.validate().is_err());
        cfg.timeout_secs = 500;
        assert!(cfg.validate().is_err());
    }
}

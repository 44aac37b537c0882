//! Clinic rules source configuration

use serde::Deserialize;

/// Clinic rules source
///
/// Points at a JSON document with the clinic's schedule and business rules.
/// When absent, the slot engine runs in fallback mode (standard hours,
/// every doctor bookable).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesConfig {
    /// Path to the rules JSON file
    pub path: Option<String>,
}

impl RulesConfig {
    pub fn is_configured(&self) -> bool {
        self.path.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

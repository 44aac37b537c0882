//! Clinic rules provider port.
//!
//! The rules document is ingested outside this service; the engine only
//! needs the latest version. Absence is a normal condition that triggers
//! default slot generation.

use async_trait::async_trait;

use crate::domain::foundation::DialogError;
use crate::domain::slots::ClinicRules;

/// Port supplying the current clinic rules document, latest version wins.
#[async_trait]
pub trait ClinicRulesProvider: Send + Sync {
    /// Current rules, or `None` when no document has been ingested.
    async fn current(&self) -> Result<Option<ClinicRules>, DialogError>;
}

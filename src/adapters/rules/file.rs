//! File-backed clinic rules provider.
//!
//! The rules document is maintained by clinic staff and re-read on every
//! request, so edits take effect without a restart. A missing or
//! unconfigured file means fallback mode, not an error.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::foundation::DialogError;
use crate::domain::slots::ClinicRules;
use crate::ports::ClinicRulesProvider;

pub struct FileRulesProvider {
    path: Option<PathBuf>,
}

impl FileRulesProvider {
    pub fn new(path: Option<impl Into<PathBuf>>) -> Self {
        Self {
            path: path.map(Into::into),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }
}

#[async_trait]
impl ClinicRulesProvider for FileRulesProvider {
    async fn current(&self) -> Result<Option<ClinicRules>, DialogError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "rules file not found, running in fallback mode");
                return Ok(None);
            }
            Err(err) => {
                return Err(DialogError::external(
                    "rules",
                    format!("failed to read {}: {}", path.display(), err),
                ))
            }
        };
        let rules: ClinicRules = serde_json::from_str(&raw).map_err(|e| {
            DialogError::external("rules", format!("invalid rules document: {}", e))
        })?;
        Ok(Some(rules))
    }
}

//! Log-based moderator notifier.
//!
//! Emits follow-up summaries as structured log events. A messenger-channel
//! notifier can replace this behind the same port without touching scenes.

use async_trait::async_trait;
use tracing::info;

use crate::domain::foundation::DialogError;
use crate::ports::ModeratorNotifier;

#[derive(Default)]
pub struct TracingModeratorNotifier;

impl TracingModeratorNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ModeratorNotifier for TracingModeratorNotifier {
    async fn notify(&self, user_id: &str, summary: &str) -> Result<(), DialogError> {
        info!(user_id = %user_id, summary = %summary, "moderator notification");
        Ok(())
    }
}

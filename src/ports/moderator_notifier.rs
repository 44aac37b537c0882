//! Moderator notifier port.
//!
//! Completed (or degraded) booking attempts are summarized for a human
//! moderator. The transport is out of scope; this port keeps the hook.

use async_trait::async_trait;

use crate::domain::foundation::DialogError;

/// Port for forwarding a short summary to the clinic's moderator channel.
#[async_trait]
pub trait ModeratorNotifier: Send + Sync {
    /// Deliver one notification. Failures are logged by callers, never
    /// surfaced to the end user.
    async fn notify(&self, user_id: &str, summary: &str) -> Result<(), DialogError>;
}

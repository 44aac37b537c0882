//! Session store port.
//!
//! Defines the contract for persisting per-user conversation sessions and
//! the rolling message history. Entries are TTL-bound so abandoned flows
//! self-clean without explicit cancellation.

use async_trait::async_trait;

use crate::domain::foundation::DialogError;
use crate::domain::scenes::{ConversationSession, HistoryEntry};

/// Key-value store port for conversation sessions.
///
/// Implementations must ensure:
/// - at most one session per user (save overwrites);
/// - the same TTL on session and history entries;
/// - a stored record whose scene name is no longer registered surfaces as
///   `DialogError::StateCorruption`, never as a panic.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for a user.
    ///
    /// Returns `None` if absent or expired.
    async fn load(&self, user_id: &str) -> Result<Option<ConversationSession>, DialogError>;

    /// Save (or overwrite) the session for a user, refreshing its TTL.
    async fn save(&self, session: &ConversationSession) -> Result<(), DialogError>;

    /// Delete the session for a user. Deleting a missing session is not an
    /// error.
    async fn clear(&self, user_id: &str) -> Result<(), DialogError>;

    /// Append one entry to the user's rolling history, trimming to the
    /// configured cap.
    async fn append_history(&self, user_id: &str, entry: HistoryEntry) -> Result<(), DialogError>;

    /// Load the user's history, oldest first.
    async fn load_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, DialogError>;

    /// Delete the user's history.
    async fn clear_history(&self, user_id: &str) -> Result<(), DialogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn session_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SessionStore) {}
    }
}

//! In-memory session store for tests and local development.
//!
//! Mirrors the Redis layout by storing serialized JSON, so corrupted
//! records surface through the same `StateCorruption` path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::DialogError;
use crate::domain::scenes::{ConversationSession, HistoryEntry};
use crate::ports::SessionStore;

use super::HISTORY_LIMIT;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, String>>,
    histories: Mutex<HashMap<String, Vec<HistoryEntry>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw record, bypassing serialization. Lets tests exercise the
    /// corruption path the same way a stale Redis record would.
    pub fn insert_raw(&self, user_id: &str, raw: &str) {
        self.sessions
            .lock()
            .unwrap()
            .insert(user_id.to_string(), raw.to_string());
    }

    pub fn has_session(&self, user_id: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(user_id)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<ConversationSession>, DialogError> {
        match self.sessions.lock().unwrap().get(user_id) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw).map(Some).map_err(|e| {
                DialogError::StateCorruption(format!("session for {}: {}", user_id, e))
            }),
        }
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), DialogError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| DialogError::StateCorruption(e.to_string()))?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id.clone(), raw);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), DialogError> {
        self.sessions.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn append_history(&self, user_id: &str, entry: HistoryEntry) -> Result<(), DialogError> {
        let mut histories = self.histories.lock().unwrap();
        let history = histories.entry(user_id.to_string()).or_default();
        history.push(entry);
        if history.len() > HISTORY_LIMIT {
            let excess = history.len() - HISTORY_LIMIT;
            history.drain(..excess);
        }
        Ok(())
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, DialogError> {
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), DialogError> {
        self.histories.lock().unwrap().remove(user_id);
        Ok(())
    }
}

//! Redis-backed session store.
//!
//! Sessions and histories live under `tg-bot:session:{userId}` and
//! `tg-bot:history:{userId}` with a shared TTL, so abandoned conversations
//! expire on their own.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::DialogError;
use crate::domain::scenes::{ConversationSession, HistoryEntry};
use crate::ports::SessionStore;

use super::HISTORY_LIMIT;

const SESSION_KEY_PREFIX: &str = "tg-bot:session:";
const HISTORY_KEY_PREFIX: &str = "tg-bot:history:";

pub struct RedisSessionStore {
    connection: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(connection: MultiplexedConnection, ttl: Duration) -> Self {
        Self {
            connection,
            ttl_secs: ttl.as_secs().max(1),
        }
    }

    fn session_key(user_id: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, user_id)
    }

    fn history_key(user_id: &str) -> String {
        format!("{}{}", HISTORY_KEY_PREFIX, user_id)
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

fn map_redis_error(err: redis::RedisError) -> DialogError {
    DialogError::external("redis", err.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<ConversationSession>, DialogError> {
        let mut connection = self.connection();
        let raw: Option<String> = connection
            .get(Self::session_key(user_id))
            .await
            .map_err(map_redis_error)?;
        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                DialogError::StateCorruption(format!("session for {}: {}", user_id, e))
            }),
        }
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), DialogError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| DialogError::StateCorruption(e.to_string()))?;
        let mut connection = self.connection();
        redis::cmd("SET")
            .arg(Self::session_key(&session.user_id))
            .arg(raw)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(map_redis_error)
    }

    async fn clear(&self, user_id: &str) -> Result<(), DialogError> {
        let mut connection = self.connection();
        connection
            .del::<_, ()>(Self::session_key(user_id))
            .await
            .map_err(map_redis_error)
    }

    async fn append_history(&self, user_id: &str, entry: HistoryEntry) -> Result<(), DialogError> {
        let raw = serde_json::to_string(&entry)
            .map_err(|e| DialogError::StateCorruption(e.to_string()))?;
        let key = Self::history_key(user_id);
        let mut connection = self.connection();
        redis::pipe()
            .cmd("RPUSH")
            .arg(&key)
            .arg(raw)
            .ignore()
            .cmd("LTRIM")
            .arg(&key)
            .arg(-(HISTORY_LIMIT as isize))
            .arg(-1)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_secs)
            .ignore()
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(map_redis_error)
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, DialogError> {
        let mut connection = self.connection();
        let raw: Vec<String> = connection
            .lrange(Self::history_key(user_id), 0, -1)
            .await
            .map_err(map_redis_error)?;
        // Entries that no longer parse are skipped rather than fatal.
        Ok(raw
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), DialogError> {
        let mut connection = self.connection();
        connection
            .del::<_, ()>(Self::history_key(user_id))
            .await
            .map_err(map_redis_error)
    }
}

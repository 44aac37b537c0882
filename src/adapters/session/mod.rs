//! Session store adapters.

mod memory;
mod redis;

pub use memory::InMemorySessionStore;
pub use redis::RedisSessionStore;

/// Rolling history cap per user.
pub const HISTORY_LIMIT: usize = 12;

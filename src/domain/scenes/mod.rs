//! Conversation scene engine.
//!
//! Each scene is a serializable state machine advanced one user message at
//! a time. `SceneRouter` dispatches on the `SceneState` sum type;
//! `classify_intent` starts scenes for users outside any flow.

pub mod cancel;
pub mod common;
pub mod confirm;
pub mod create;
pub mod intent;
pub mod move_appointment;
pub mod router;
pub mod scene;
pub mod session;
pub mod show;

#[cfg(test)]
pub(crate) mod testing;

pub use confirm::ConfirmState;
pub use intent::classify_intent;
pub use router::SceneRouter;
pub use scene::{SceneAction, SceneReply, SceneServices, SceneState};
pub use session::{ConversationSession, HistoryEntry, HistoryRole, SceneName};

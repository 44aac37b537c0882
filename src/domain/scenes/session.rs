//! Per-user conversation session and rolling history.

use serde::{Deserialize, Serialize};

use super::scene::SceneState;

/// Names of the registered scenes, used for intent routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneName {
    CreateAppointment,
    MoveAppointment,
    CancelAppointment,
    ShowAppointment,
    ConfirmAppointment,
}

impl SceneName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneName::CreateAppointment => "create_appointment",
            SceneName::MoveAppointment => "move_appointment",
            SceneName::CancelAppointment => "cancel_appointment",
            SceneName::ShowAppointment => "show_appointment",
            SceneName::ConfirmAppointment => "confirm_appointment",
        }
    }
}

/// Per-user persisted record of the currently active scene.
///
/// At most one active scene per user. Created on first scene entry,
/// overwritten each turn, deleted on completion, explicit exit, or reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub user_id: String,
    #[serde(default)]
    pub active_scene: Option<SceneState>,
}

impl ConversationSession {
    pub fn new(user_id: impl Into<String>, scene: SceneState) -> Self {
        Self {
            user_id: user_id.into(),
            active_scene: Some(scene),
        }
    }
}

/// Author of one history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRole {
    User,
    Bot,
}

/// One transcript line in the rolling per-user history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub text: String,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: HistoryRole::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { role: HistoryRole::Bot, text: text.into() }
    }
}

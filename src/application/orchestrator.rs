//! Dialog orchestrator.
//!
//! One inbound message per turn: reset check, session load, scene dispatch
//! or intent classification, side effects, persistence. Internal failures
//! collapse into a generic reply; the user never sees a raw error.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::domain::foundation::DialogError;
use crate::domain::scenes::{
    classify_intent, ConfirmState, ConversationSession, HistoryEntry, SceneAction, SceneReply,
    SceneRouter, SceneServices, SceneState,
};
use crate::ports::{ModeratorNotifier, SessionStore};

/// Commands that wipe the session and history regardless of scene state.
const RESET_COMMANDS: [&str; 4] = ["/exit", "/cancel", "/stop", "отмена"];

const RESET_MESSAGE: &str = "Хорошо, текущий процесс отменен. Чем еще могу помочь?";
const CORRUPTION_MESSAGE: &str =
    "Произошла ошибка с вашей сессией, начнем сначала. Чем могу помочь?";
const GENERIC_ERROR_MESSAGE: &str = "Произошла ошибка. Попробуйте позже.";
const GREETING_MESSAGE: &str = "👋 Здравствуйте! Я помощник ветеринарной клиники. Могу записать \
вас на прием, перенести или отменить запись, а также показать ваши записи. Напишите, что нужно \
сделать.";

pub struct DialogOrchestrator {
    sessions: Arc<dyn SessionStore>,
    services: SceneServices,
    notifier: Arc<dyn ModeratorNotifier>,
}

impl DialogOrchestrator {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        services: SceneServices,
        notifier: Arc<dyn ModeratorNotifier>,
    ) -> Self {
        Self {
            sessions,
            services,
            notifier,
        }
    }

    /// Handle one inbound message, returning the bot replies in order.
    ///
    /// Never fails: internal errors are logged and replaced with a generic
    /// reply.
    #[instrument(skip(self, text), fields(user_id = %user_id))]
    pub async fn handle_message(&self, user_id: &str, text: &str) -> Vec<String> {
        match self.handle_inner(user_id, text).await {
            Ok(messages) => messages,
            Err(err) => {
                error!(error = %err, "turn failed");
                vec![GENERIC_ERROR_MESSAGE.to_string()]
            }
        }
    }

    /// Seed a confirmation dialog for an externally scheduled reminder.
    ///
    /// Overwrites any active scene: the reminder takes priority.
    pub async fn begin_confirmation(
        &self,
        user_id: &str,
        appointment_id: u64,
    ) -> Result<Vec<String>, DialogError> {
        let state = SceneState::ConfirmAppointment(ConfirmState::for_appointment(appointment_id));
        self.sessions
            .save(&ConversationSession::new(user_id, state))
            .await?;
        let prompt = "🔔 Напоминаем о вашей записи на прием. Подтвердите, пожалуйста, что вы \
придете: ответьте «да» или «нет»."
            .to_string();
        self.record_history(user_id, None, &[prompt.clone()]).await;
        Ok(vec![prompt])
    }

    async fn handle_inner(&self, user_id: &str, text: &str) -> Result<Vec<String>, DialogError> {
        let trimmed = text.trim();

        if is_reset_command(trimmed) {
            self.sessions.clear(user_id).await?;
            self.sessions.clear_history(user_id).await?;
            return Ok(vec![RESET_MESSAGE.to_string()]);
        }

        let session = match self.sessions.load(user_id).await {
            Ok(session) => session,
            Err(DialogError::StateCorruption(detail)) => {
                warn!(detail = %detail, "corrupted session wiped");
                self.sessions.clear(user_id).await?;
                self.sessions.clear_history(user_id).await?;
                self.record_history(user_id, Some(trimmed), &[CORRUPTION_MESSAGE.to_string()])
                    .await;
                return Ok(vec![CORRUPTION_MESSAGE.to_string()]);
            }
            Err(err) => return Err(err),
        };

        if let Some(state) = session.and_then(|s| s.active_scene) {
            info!(scene = state.scene_name().as_str(), "continuing scene");
            let reply = SceneRouter::dispatch(&self.services, state, trimmed).await;
            return self.apply_reply(user_id, trimmed, reply).await;
        }

        let Some(intent) = classify_intent(trimmed) else {
            self.record_history(user_id, Some(trimmed), &[GREETING_MESSAGE.to_string()])
                .await;
            return Ok(vec![GREETING_MESSAGE.to_string()]);
        };

        let Some(initial) = SceneRouter::initial_state(intent) else {
            // Confirm has no user entry point; treat like no intent.
            self.record_history(user_id, Some(trimmed), &[GREETING_MESSAGE.to_string()])
                .await;
            return Ok(vec![GREETING_MESSAGE.to_string()]);
        };
        info!(scene = intent.as_str(), "starting scene");
        let reply = SceneRouter::dispatch(&self.services, initial, trimmed).await;
        self.apply_reply(user_id, trimmed, reply).await
    }

    async fn apply_reply(
        &self,
        user_id: &str,
        user_text: &str,
        reply: SceneReply,
    ) -> Result<Vec<String>, DialogError> {
        let mut messages = reply.responses.clone();

        if let Some(action) = reply.action {
            if let Err(err) = self.execute_action(action).await {
                error!(error = %err, "scene action failed");
                messages.push(
                    "⚠️ Не удалось обработать запись в системе. Менеджер свяжется с вами."
                        .to_string(),
                );
                if let Err(err) = self
                    .notifier
                    .notify(user_id, &format!("⚠️ Ошибка действия по записи: {:?}", action))
                    .await
                {
                    warn!(error = %err, "moderator notification failed");
                }
            }
        }

        if let Some(note) = &reply.notify_moderator {
            if let Err(err) = self.notifier.notify(user_id, note).await {
                warn!(error = %err, "moderator notification failed");
            }
        }

        if reply.completed || reply.exit_scene {
            self.sessions.clear(user_id).await?;
        } else {
            self.sessions
                .save(&ConversationSession::new(user_id, reply.state))
                .await?;
        }

        self.record_history(user_id, Some(user_text), &messages).await;
        Ok(messages)
    }

    async fn execute_action(&self, action: SceneAction) -> Result<(), DialogError> {
        match action {
            SceneAction::ConfirmAppointment(id) => {
                self.services.booking.confirm_appointment(id).await
            }
            SceneAction::CancelAppointment(id) => self.services.booking.cancel_appointment(id).await,
        }
    }

    /// History writes are best-effort: a failure never breaks the turn.
    async fn record_history(&self, user_id: &str, user_text: Option<&str>, replies: &[String]) {
        if let Some(text) = user_text.filter(|t| !t.is_empty()) {
            if let Err(err) = self
                .sessions
                .append_history(user_id, HistoryEntry::user(text))
                .await
            {
                warn!(error = %err, "history append failed");
                return;
            }
        }
        for reply in replies {
            if let Err(err) = self
                .sessions
                .append_history(user_id, HistoryEntry::bot(reply))
                .await
            {
                warn!(error = %err, "history append failed");
                return;
            }
        }
    }
}

fn is_reset_command(text: &str) -> bool {
    let normalized = text.to_lowercase();
    RESET_COMMANDS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::session::InMemorySessionStore;
    use crate::adapters::notifier::TracingModeratorNotifier;
    use crate::domain::scenes::testing::{FakeBooking, FakeRules};
    use chrono::NaiveDate;

    fn orchestrator() -> (DialogOrchestrator, Arc<InMemorySessionStore>, Arc<FakeBooking>) {
        let store = Arc::new(InMemorySessionStore::new());
        let booking = Arc::new(FakeBooking::default());
        let services = SceneServices::new(booking.clone(), Arc::new(FakeRules::none()))
            .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let orchestrator = DialogOrchestrator::new(
            store.clone(),
            services,
            Arc::new(TracingModeratorNotifier::new()),
        );
        (orchestrator, store, booking)
    }

    #[tokio::test]
    async fn unknown_text_yields_greeting_and_no_session() {
        let (orchestrator, store, _) = orchestrator();
        let replies = orchestrator.handle_message("u1", "какая погода?").await;
        assert!(replies[0].contains("помощник"));
        assert!(!store.has_session("u1"));
    }

    #[tokio::test]
    async fn create_intent_starts_a_scene_and_persists_it() {
        let (orchestrator, store, _) = orchestrator();
        let replies = orchestrator.handle_message("u1", "хочу записаться на прием").await;
        assert!(!replies.is_empty());
        assert!(store.has_session("u1"));

        // Next message continues the same scene (symptoms step).
        let replies = orchestrator.handle_message("u1", "у кота рвота").await;
        assert!(replies.iter().any(|r| r.contains("Симптомы")));
    }

    #[tokio::test]
    async fn reset_command_wipes_session_and_history() {
        let (orchestrator, store, _) = orchestrator();
        orchestrator.handle_message("u1", "хочу записаться").await;
        assert!(store.has_session("u1"));

        let replies = orchestrator.handle_message("u1", "/exit").await;
        assert!(replies[0].contains("отменен"));
        assert!(!store.has_session("u1"));
        assert!(store.load_history("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_is_case_insensitive_and_in_russian() {
        let (orchestrator, store, _) = orchestrator();
        orchestrator.handle_message("u1", "хочу записаться").await;
        orchestrator.handle_message("u1", " Отмена ").await;
        assert!(!store.has_session("u1"));
    }

    #[tokio::test]
    async fn corrupted_session_is_wiped_with_restart_message() {
        let (orchestrator, store, _) = orchestrator();
        store.insert_raw(
            "u1",
            r#"{"user_id": "u1", "active_scene": {"name": "legacy_scene", "state": {}}}"#,
        );
        let replies = orchestrator.handle_message("u1", "привет").await;
        assert!(replies[0].contains("начнем сначала"));
        assert!(!store.has_session("u1"));
    }

    #[tokio::test]
    async fn confirmation_seed_and_positive_answer_confirms_booking() {
        let (orchestrator, store, booking) = orchestrator();
        let prompt = orchestrator.begin_confirmation("u1", 42).await.unwrap();
        assert!(prompt[0].contains("Напоминаем"));
        assert!(store.has_session("u1"));

        let replies = orchestrator.handle_message("u1", "да").await;
        assert!(replies[0].contains("подтверждена"));
        assert_eq!(booking.confirmed_ids(), vec![42]);
        assert!(!store.has_session("u1"));
    }

    #[tokio::test]
    async fn confirmation_negative_answer_cancels_booking() {
        let (orchestrator, _, booking) = orchestrator();
        orchestrator.begin_confirmation("u1", 42).await.unwrap();
        let replies = orchestrator.handle_message("u1", "нет").await;
        assert!(replies[0].contains("отменена"));
        assert_eq!(booking.cancelled_ids(), vec![42]);
    }

    #[tokio::test]
    async fn history_records_both_sides_of_the_turn() {
        let (orchestrator, store, _) = orchestrator();
        orchestrator.handle_message("u1", "хочу записаться").await;
        let history = store.load_history("u1").await.unwrap();
        assert!(history.len() >= 2);
        assert_eq!(history[0].text, "хочу записаться");
    }

    #[tokio::test]
    async fn failed_confirm_action_degrades_gracefully() {
        let (orchestrator, _, booking) = orchestrator();
        orchestrator.begin_confirmation("u1", 42).await.unwrap();
        booking.fail_appointments();
        let replies = orchestrator.handle_message("u1", "да").await;
        assert!(replies.iter().any(|r| r.contains("Менеджер")));
    }
}

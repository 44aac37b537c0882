//! Scene contract: state sum type, reply envelope, and the shared
//! interpreter-first step check.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ports::{
    BookingClient, ClinicRulesProvider, InterpretRequest, StepInterpreter, StepIntent,
};

use super::cancel::CancelState;
use super::confirm::ConfirmState;
use super::create::CreateState;
use super::move_appointment::MoveState;
use super::session::SceneName;
use super::show::ShowState;

/// Tagged union of every registered scene's state.
///
/// One variant per scene; the serialized `name` tag doubles as the scene
/// registry key, so a stored record with an unknown name fails to
/// deserialize and is treated as state corruption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "state", rename_all = "snake_case")]
pub enum SceneState {
    CreateAppointment(CreateState),
    MoveAppointment(MoveState),
    CancelAppointment(CancelState),
    ShowAppointment(ShowState),
    ConfirmAppointment(ConfirmState),
}

impl SceneState {
    pub fn scene_name(&self) -> SceneName {
        match self {
            SceneState::CreateAppointment(_) => SceneName::CreateAppointment,
            SceneState::MoveAppointment(_) => SceneName::MoveAppointment,
            SceneState::CancelAppointment(_) => SceneName::CancelAppointment,
            SceneState::ShowAppointment(_) => SceneName::ShowAppointment,
            SceneState::ConfirmAppointment(_) => SceneName::ConfirmAppointment,
        }
    }
}

/// Side effect a completed scene asks the orchestrator to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneAction {
    ConfirmAppointment(u64),
    CancelAppointment(u64),
}

/// Result of one scene turn.
#[derive(Debug, Clone)]
pub struct SceneReply {
    pub state: SceneState,
    pub responses: Vec<String>,
    pub completed: bool,
    pub exit_scene: bool,
    pub action: Option<SceneAction>,
    pub notify_moderator: Option<String>,
}

impl SceneReply {
    pub fn next(state: SceneState, responses: Vec<String>) -> Self {
        Self {
            state,
            responses,
            completed: false,
            exit_scene: false,
            action: None,
            notify_moderator: None,
        }
    }

    pub fn completed(state: SceneState, responses: Vec<String>) -> Self {
        Self {
            completed: true,
            ..Self::next(state, responses)
        }
    }

    pub fn exit(state: SceneState, responses: Vec<String>) -> Self {
        Self {
            exit_scene: true,
            ..Self::next(state, responses)
        }
    }

    pub fn with_action(mut self, action: SceneAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_moderator_note(mut self, note: impl Into<String>) -> Self {
        self.notify_moderator = Some(note.into());
        self
    }
}

/// External collaborators scenes call during a turn.
///
/// The interpreter is optional: scenes fall back to deterministic
/// validation when it is disabled or unreachable.
#[derive(Clone)]
pub struct SceneServices {
    pub booking: Arc<dyn BookingClient>,
    pub rules: Arc<dyn ClinicRulesProvider>,
    pub interpreter: Option<Arc<dyn StepInterpreter>>,
    today_override: Option<NaiveDate>,
}

impl SceneServices {
    pub fn new(booking: Arc<dyn BookingClient>, rules: Arc<dyn ClinicRulesProvider>) -> Self {
        Self {
            booking,
            rules,
            interpreter: None,
            today_override: None,
        }
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn StepInterpreter>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    /// Pin "today" for deterministic tests.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Interpreter verdict for one step, already defaulted to the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepVerdict {
    /// Proceed with this effective message (normalized or raw).
    Answer(String),
    /// The user changed the subject; optional suggested reply.
    OffTopic(Option<String>),
    /// The user wants out; optional suggested reply.
    Refuse(Option<String>),
}

/// Runs the interpreter-first check for a step.
///
/// Steps without a label, empty input, a disabled interpreter, or an
/// interpreter failure all resolve to `Answer(raw)` so deterministic
/// validation stays the source of truth.
pub(crate) async fn interpret_step(
    services: &SceneServices,
    step_id: &str,
    step_label: &str,
    format_hint: Option<&str>,
    message: &str,
) -> StepVerdict {
    let trimmed = message.trim().to_string();
    let interpreter = match &services.interpreter {
        Some(interpreter) if !trimmed.is_empty() && !step_label.is_empty() => interpreter,
        _ => return StepVerdict::Answer(trimmed),
    };

    let mut request = InterpretRequest::new(step_id, step_label, trimmed.clone());
    if let Some(hint) = format_hint {
        request = request.with_format_hint(hint);
    }

    match interpreter.interpret(request).await {
        Ok(result) => match result.intent {
            StepIntent::Answer => {
                StepVerdict::Answer(result.validated_value.unwrap_or(trimmed))
            }
            StepIntent::OffTopic => StepVerdict::OffTopic(result.reply_message),
            StepIntent::Refuse => StepVerdict::Refuse(result.reply_message),
        },
        Err(err) => {
            warn!(step = step_id, error = %err, "step interpreter unavailable, using raw input");
            StepVerdict::Answer(trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DialogError;
    use crate::domain::scenes::create::CreateState;
    use crate::ports::Interpretation;
    use async_trait::async_trait;

    struct StaticInterpreter(Result<Interpretation, DialogError>);

    #[async_trait]
    impl StepInterpreter for StaticInterpreter {
        async fn interpret(
            &self,
            _request: InterpretRequest,
        ) -> Result<Interpretation, DialogError> {
            self.0.clone()
        }
    }

    struct NoBooking;

    #[async_trait]
    impl BookingClient for NoBooking {
        async fn get_client_by_phone(
            &self,
            _phone: &str,
        ) -> Result<Option<crate::ports::CrmClient>, DialogError> {
            Ok(None)
        }
        async fn create_client(
            &self,
            _l: &str,
            _f: &str,
            _m: &str,
            _p: &str,
        ) -> Result<crate::ports::CrmClient, DialogError> {
            Err(DialogError::external("crm", "unavailable"))
        }
        async fn create_pet(
            &self,
            _c: u64,
            _n: &str,
            _t: u32,
            _b: u32,
        ) -> Result<u64, DialogError> {
            Err(DialogError::external("crm", "unavailable"))
        }
        async fn get_doctors_with_appointment(
            &self,
        ) -> Result<Vec<crate::ports::Doctor>, DialogError> {
            Ok(vec![])
        }
        async fn get_doctor_occupied_times(
            &self,
            _d: u64,
        ) -> Result<Vec<chrono::NaiveDateTime>, DialogError> {
            Ok(vec![])
        }
        async fn get_client_appointments(
            &self,
            _c: u64,
        ) -> Result<Vec<crate::ports::Appointment>, DialogError> {
            Ok(vec![])
        }
        async fn create_appointment(
            &self,
            _r: &crate::ports::CreateAppointment,
        ) -> Result<(), DialogError> {
            Err(DialogError::external("crm", "unavailable"))
        }
        async fn reschedule_appointment(
            &self,
            _i: u64,
            _c: u32,
            _s: chrono::NaiveDateTime,
            _e: chrono::NaiveDateTime,
        ) -> Result<(), DialogError> {
            Err(DialogError::external("crm", "unavailable"))
        }
        async fn cancel_appointment(&self, _i: u64) -> Result<(), DialogError> {
            Err(DialogError::external("crm", "unavailable"))
        }
        async fn confirm_appointment(&self, _i: u64) -> Result<(), DialogError> {
            Err(DialogError::external("crm", "unavailable"))
        }
        async fn get_available_dates(
            &self,
            _d: u32,
            _c: u32,
        ) -> Result<Vec<chrono::NaiveDate>, DialogError> {
            Ok(vec![])
        }
        async fn get_occupied_time_slots(
            &self,
            _d: chrono::NaiveDate,
            _c: u32,
        ) -> Result<Vec<String>, DialogError> {
            Ok(vec![])
        }
    }

    struct NoRules;

    #[async_trait]
    impl ClinicRulesProvider for NoRules {
        async fn current(
            &self,
        ) -> Result<Option<crate::domain::slots::ClinicRules>, DialogError> {
            Ok(None)
        }
    }

    fn services() -> SceneServices {
        SceneServices::new(Arc::new(NoBooking), Arc::new(NoRules))
    }

    #[tokio::test]
    async fn missing_interpreter_passes_raw_text_through() {
        let verdict = interpret_step(&services(), "symptoms", "Симптомы?", None, "  рвота ").await;
        assert_eq!(verdict, StepVerdict::Answer("рвота".to_string()));
    }

    #[tokio::test]
    async fn interpreter_failure_falls_back_to_raw_text() {
        let services = services().with_interpreter(Arc::new(StaticInterpreter(Err(
            DialogError::external("interpreter", "timeout"),
        ))));
        let verdict = interpret_step(&services, "symptoms", "Симптомы?", None, "рвота").await;
        assert_eq!(verdict, StepVerdict::Answer("рвота".to_string()));
    }

    #[tokio::test]
    async fn interpreter_normalized_value_wins_over_raw() {
        let services = services().with_interpreter(Arc::new(StaticInterpreter(Ok(
            Interpretation::answer(Some("+79991234567".to_string())),
        ))));
        let verdict =
            interpret_step(&services, "owner_phone", "Телефон?", None, "8 999 123 45 67").await;
        assert_eq!(verdict, StepVerdict::Answer("+79991234567".to_string()));
    }

    #[tokio::test]
    async fn empty_input_skips_the_interpreter() {
        // An interpreter that would refuse; empty input must never reach it.
        let services = services().with_interpreter(Arc::new(StaticInterpreter(Ok(
            Interpretation {
                intent: StepIntent::Refuse,
                validated_value: None,
                reply_message: None,
            },
        ))));
        let verdict = interpret_step(&services, "symptoms", "Симптомы?", None, "   ").await;
        assert_eq!(verdict, StepVerdict::Answer(String::new()));
    }

    #[test]
    fn scene_state_reports_its_name() {
        let state = SceneState::CreateAppointment(CreateState::default());
        assert_eq!(state.scene_name(), SceneName::CreateAppointment);
    }
}

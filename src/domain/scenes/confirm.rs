//! Confirm-appointment scene.
//!
//! Not user-initiated: seeded externally (a reminder job) with the
//! appointment id, then waits for a single yes/no answer. The resulting
//! action is performed by the orchestrator after the scene returns.

use serde::{Deserialize, Serialize};

use super::common::{is_negative_response, is_positive_response};
use super::scene::{
    interpret_step, SceneAction, SceneReply, SceneServices, SceneState, StepVerdict,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmStep {
    WaitingConfirmation,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmState {
    pub step: ConfirmStep,
    pub appointment_id: u64,
}

impl ConfirmState {
    pub fn for_appointment(appointment_id: u64) -> Self {
        Self {
            step: ConfirmStep::WaitingConfirmation,
            appointment_id,
        }
    }
}

pub struct ConfirmScene<'a> {
    services: &'a SceneServices,
}

impl<'a> ConfirmScene<'a> {
    pub fn new(services: &'a SceneServices) -> Self {
        Self { services }
    }

    pub async fn handle_message(&self, state: ConfirmState, raw_message: &str) -> SceneReply {
        if state.step == ConfirmStep::Completed {
            return SceneReply::exit(SceneState::ConfirmAppointment(state), vec![]);
        }

        let verdict = interpret_step(
            self.services,
            "waiting_confirmation",
            "Подтвердите, пожалуйста, вашу запись на прием: ответьте «да» или «нет».",
            None,
            raw_message,
        )
        .await;

        let effective = match verdict {
            StepVerdict::Refuse(reply) | StepVerdict::OffTopic(reply) => {
                // The appointment stays untouched on any detour.
                let text = reply.unwrap_or_else(|| {
                    "Хорошо. Запись остается без изменений.".to_string()
                });
                return SceneReply::exit(SceneState::ConfirmAppointment(state), vec![text]);
            }
            StepVerdict::Answer(value) => value,
        };

        let appointment_id = state.appointment_id;
        if is_positive_response(&effective) {
            return SceneReply::completed(
                SceneState::ConfirmAppointment(ConfirmState {
                    step: ConfirmStep::Completed,
                    appointment_id,
                }),
                vec!["✅ Спасибо! Ваша запись подтверждена. Ждем вас в клинике.".to_string()],
            )
            .with_action(SceneAction::ConfirmAppointment(appointment_id));
        }
        if is_negative_response(&effective) {
            return SceneReply::completed(
                SceneState::ConfirmAppointment(ConfirmState {
                    step: ConfirmStep::Completed,
                    appointment_id,
                }),
                vec!["Запись отменена. Если захотите записаться снова — напишите нам.".to_string()],
            )
            .with_action(SceneAction::CancelAppointment(appointment_id))
            .with_moderator_note(format!(
                "❌ Клиент отменил запись #{} по напоминанию",
                appointment_id
            ));
        }

        SceneReply::next(
            SceneState::ConfirmAppointment(state),
            vec![
                "Ответьте, пожалуйста, «да», чтобы подтвердить запись, или «нет», чтобы отменить."
                    .to_string(),
            ],
        )
    }
}

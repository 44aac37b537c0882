//! Show-appointments scene: single-pass listing by phone.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::foundation::normalize_phone;
use crate::ports::Appointment;

use super::scene::{interpret_step, SceneReply, SceneServices, SceneState, StepVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowStep {
    Intro,
    Phone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowState {
    pub step: ShowStep,
}

impl Default for ShowState {
    fn default() -> Self {
        Self { step: ShowStep::Intro }
    }
}

pub struct ShowScene<'a> {
    services: &'a SceneServices,
}

impl<'a> ShowScene<'a> {
    pub fn new(services: &'a SceneServices) -> Self {
        Self { services }
    }

    pub fn initial_state() -> ShowState {
        ShowState::default()
    }

    pub async fn handle_message(&self, state: ShowState, raw_message: &str) -> SceneReply {
        if state.step == ShowStep::Intro {
            return SceneReply::next(
                SceneState::ShowAppointment(ShowState { step: ShowStep::Phone }),
                vec![
                    "📋 Просмотр записей.\nУкажите номер телефона, на который оформлена запись."
                        .to_string(),
                ],
            );
        }

        let verdict = interpret_step(
            self.services,
            "phone",
            "Укажите номер телефона, на который оформлена запись.",
            Some("телефон +7XXXXXXXXXX"),
            raw_message,
        )
        .await;

        let effective = match verdict {
            StepVerdict::Refuse(reply) | StepVerdict::OffTopic(reply) => {
                let text = reply.unwrap_or_else(|| {
                    "Хорошо. Если понадобится посмотреть записи — напишите снова.".to_string()
                });
                return SceneReply::exit(SceneState::ShowAppointment(state), vec![text]);
            }
            StepVerdict::Answer(value) => value,
        };

        let phone = match normalize_phone(&effective) {
            Ok(phone) => phone,
            Err(_) => {
                return SceneReply::next(
                    SceneState::ShowAppointment(state),
                    vec![
                        "Не удалось распознать номер телефона. Введите его в формате +7XXXXXXXXXX."
                            .to_string(),
                    ],
                )
            }
        };

        // Single pass: respond and complete regardless of the outcome.
        let responses = match self.upcoming_appointments(&phone).await {
            Err(err) => {
                error!(error = %err, "appointment lookup failed");
                vec!["Произошла ошибка при поиске записей. Попробуйте позже.".to_string()]
            }
            Ok(None) => vec![format!(
                "Клиент с номером {} не найден. Проверьте номер или обратитесь к администратору.",
                phone
            )],
            Ok(Some(appointments)) if appointments.is_empty() => {
                vec!["У вас нет предстоящих записей.".to_string()]
            }
            Ok(Some(appointments)) => vec![appointments_message(&appointments)],
        };

        SceneReply::completed(
            SceneState::ShowAppointment(ShowState::default()),
            responses,
        )
    }

    async fn upcoming_appointments(
        &self,
        phone: &str,
    ) -> Result<Option<Vec<Appointment>>, crate::domain::foundation::DialogError> {
        let Some(client) = self.services.booking.get_client_by_phone(phone).await? else {
            return Ok(None);
        };
        let now = self.services.today().and_hms_opt(0, 0, 0).unwrap_or_default();
        let mut appointments: Vec<Appointment> = self
            .services
            .booking
            .get_client_appointments(client.id)
            .await?
            .into_iter()
            .filter(|a| a.admission_date >= now)
            .collect();
        appointments.sort_by_key(|a| a.admission_date);
        Ok(Some(appointments))
    }
}

fn appointments_message(appointments: &[Appointment]) -> String {
    let mut lines = vec!["📋 Ваши предстоящие записи:".to_string(), String::new()];
    for (i, appointment) in appointments.iter().enumerate() {
        let mut line = format!(
            "{}. {}",
            i + 1,
            appointment.admission_date.format("%Y-%m-%d %H:%M")
        );
        if let Some(description) = appointment.description.as_deref().filter(|d| !d.is_empty()) {
            line.push_str(&format!(" — {}", description));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenes::testing::{FakeBooking, FakeRules};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn services() -> (SceneServices, Arc<FakeBooking>) {
        let booking = Arc::new(FakeBooking::default());
        let services = SceneServices::new(booking.clone(), Arc::new(FakeRules::none()))
            .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        (services, booking)
    }

    #[tokio::test]
    async fn listing_completes_and_resets_state() {
        let (services, booking) = services();
        booking.add_client(10, "+79991234567");
        booking.add_appointment(
            300,
            10,
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap().and_hms_opt(11, 0, 0).unwrap(),
            Some(30),
        );
        let scene = ShowScene::new(&services);
        let reply = scene
            .handle_message(ShowState { step: ShowStep::Phone }, "89991234567")
            .await;
        assert!(reply.completed);
        assert!(reply.responses[0].contains("2025-06-10 11:00"));
        match reply.state {
            SceneState::ShowAppointment(state) => assert_eq!(state.step, ShowStep::Intro),
            other => panic!("unexpected scene state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_client_still_completes() {
        let (services, _) = services();
        let scene = ShowScene::new(&services);
        let reply = scene
            .handle_message(ShowState { step: ShowStep::Phone }, "+79991234567")
            .await;
        assert!(reply.completed);
        assert!(reply.responses[0].contains("не найден"));
    }

    #[tokio::test]
    async fn invalid_phone_reprompts_without_completing() {
        let (services, _) = services();
        let scene = ShowScene::new(&services);
        let reply = scene
            .handle_message(ShowState { step: ShowStep::Phone }, "abc")
            .await;
        assert!(!reply.completed);
        assert!(reply.responses[0].contains("+7XXXXXXXXXX"));
    }
}

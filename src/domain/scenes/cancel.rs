//! Cancel-appointment scene: phone, appointment selection, confirmation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::foundation::{normalize_phone, StateMachine};
use crate::ports::Appointment;

use super::common::{is_negative_response, is_positive_response, parse_list_index};
use super::scene::{interpret_step, SceneReply, SceneServices, SceneState, StepVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelStep {
    Intro,
    Phone,
    SelectAppointment,
    Confirmation,
    Completed,
}

impl StateMachine for CancelStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CancelStep::*;
        match self {
            Intro => vec![Phone],
            Phone => vec![SelectAppointment],
            SelectAppointment => vec![Confirmation],
            Confirmation => vec![Completed],
            Completed => vec![],
        }
    }
}

/// Candidate offered for cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelChoice {
    pub id: u64,
    pub admission_date: NaiveDateTime,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelData {
    pub phone: Option<String>,
    pub appointments: Vec<CancelChoice>,
    pub selected: Option<CancelChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelState {
    pub step: CancelStep,
    #[serde(default)]
    pub data: CancelData,
}

impl Default for CancelState {
    fn default() -> Self {
        Self {
            step: CancelStep::Intro,
            data: CancelData::default(),
        }
    }
}

pub struct CancelScene<'a> {
    services: &'a SceneServices,
}

impl<'a> CancelScene<'a> {
    pub fn new(services: &'a SceneServices) -> Self {
        Self { services }
    }

    pub fn initial_state() -> CancelState {
        CancelState::default()
    }

    fn step_label(step: CancelStep) -> &'static str {
        match step {
            CancelStep::Intro | CancelStep::Completed => "",
            CancelStep::Phone => "Укажите номер телефона, на который оформлена запись.",
            CancelStep::SelectAppointment => {
                "Выберите запись для отмены (введите номер из списка)."
            }
            CancelStep::Confirmation => {
                "Подтвердите отмену записи: ответьте «да» или «нет»."
            }
        }
    }

    fn format_hint(step: CancelStep) -> Option<&'static str> {
        match step {
            CancelStep::Phone => Some("телефон +7XXXXXXXXXX"),
            _ => None,
        }
    }

    pub async fn handle_message(&self, state: CancelState, raw_message: &str) -> SceneReply {
        if state.step == CancelStep::Intro {
            let next = CancelState {
                step: CancelStep::Phone,
                data: state.data,
            };
            return SceneReply::next(
                SceneState::CancelAppointment(next),
                vec![
                    "❌ Отмена записи на прием.\nУкажите номер телефона, на который оформлена запись."
                        .to_string(),
                ],
            );
        }

        let step_id = serde_json::to_value(state.step)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let verdict = interpret_step(
            self.services,
            &step_id,
            Self::step_label(state.step),
            Self::format_hint(state.step),
            raw_message,
        )
        .await;

        let effective = match verdict {
            StepVerdict::Refuse(reply) | StepVerdict::OffTopic(reply) => {
                let text = reply.unwrap_or_else(|| {
                    "Хорошо, отмена записи прервана. Если понадобится — напишите снова.".to_string()
                });
                return SceneReply::exit(SceneState::CancelAppointment(state), vec![text]);
            }
            StepVerdict::Answer(value) => value,
        };

        self.handle_step(state, &effective).await
    }

    async fn handle_step(&self, state: CancelState, message: &str) -> SceneReply {
        let mut data = state.data.clone();

        match state.step {
            CancelStep::Intro | CancelStep::Completed => SceneReply::next(
                SceneState::CancelAppointment(CancelState {
                    step: CancelStep::Phone,
                    data: CancelData::default(),
                }),
                vec![Self::step_label(CancelStep::Phone).to_string()],
            ),

            CancelStep::Phone => {
                let phone = match normalize_phone(message) {
                    Ok(phone) => phone,
                    Err(_) => {
                        return SceneReply::next(
                            SceneState::CancelAppointment(state),
                            vec![
                                "Не удалось распознать номер телефона. Введите его в формате +7XXXXXXXXXX."
                                    .to_string(),
                            ],
                        )
                    }
                };
                match self.find_appointments(&phone).await {
                    Err(err) => {
                        error!(error = %err, "appointment lookup failed");
                        SceneReply::exit(
                            SceneState::CancelAppointment(state),
                            vec!["Произошла ошибка при поиске записей. Попробуйте позже.".to_string()],
                        )
                    }
                    Ok(None) => SceneReply::exit(
                        SceneState::CancelAppointment(state),
                        vec![format!(
                            "Клиент с номером {} не найден. Проверьте номер или обратитесь к администратору.",
                            phone
                        )],
                    ),
                    Ok(Some(appointments)) if appointments.is_empty() => SceneReply::exit(
                        SceneState::CancelAppointment(state),
                        vec!["У вас нет предстоящих записей, которые можно отменить.".to_string()],
                    ),
                    Ok(Some(appointments)) => {
                        data.phone = Some(phone);
                        data.appointments = appointments
                            .iter()
                            .map(|a| CancelChoice {
                                id: a.id,
                                admission_date: a.admission_date,
                                description: a.description.clone(),
                            })
                            .collect();
                        let list = choices_list_message(&data.appointments);
                        advance(state, CancelStep::SelectAppointment, data, vec![list])
                    }
                }
            }

            CancelStep::SelectAppointment => {
                match parse_list_index(message, data.appointments.len()) {
                    None => SceneReply::next(
                        SceneState::CancelAppointment(state.clone()),
                        vec![
                            "Пожалуйста, введите номер записи из списка.".to_string(),
                            choices_list_message(&state.data.appointments),
                        ],
                    ),
                    Some(index) => {
                        let selected = data.appointments[index].clone();
                        let prompt = format!(
                            "Отменить запись на {}? Ответьте «да» или «нет».",
                            selected.admission_date.format("%Y-%m-%d %H:%M")
                        );
                        data.selected = Some(selected);
                        advance(state, CancelStep::Confirmation, data, vec![prompt])
                    }
                }
            }

            CancelStep::Confirmation => {
                if is_negative_response(message) {
                    return SceneReply::exit(
                        SceneState::CancelAppointment(state),
                        vec!["Хорошо, запись остается в силе.".to_string()],
                    );
                }
                if !is_positive_response(message) {
                    return SceneReply::next(
                        SceneState::CancelAppointment(state),
                        vec!["Ответьте, пожалуйста, «да» для отмены записи или «нет».".to_string()],
                    );
                }
                let Some(selected) = data.selected.clone() else {
                    return SceneReply::exit(
                        SceneState::CancelAppointment(state),
                        vec!["Произошла ошибка. Начните отмену заново.".to_string()],
                    );
                };
                match self.services.booking.cancel_appointment(selected.id).await {
                    Ok(()) => SceneReply::completed(
                        SceneState::CancelAppointment(CancelState {
                            step: CancelStep::Completed,
                            data,
                        }),
                        vec!["✅ Запись отменена. Будем рады видеть вас снова!".to_string()],
                    )
                    .with_moderator_note(format!(
                        "❌ ОТМЕНА ЗАПИСИ #{} ({})",
                        selected.id,
                        selected.admission_date.format("%Y-%m-%d %H:%M")
                    )),
                    Err(err) => {
                        error!(error = %err, appointment = selected.id, "cancellation failed");
                        SceneReply::exit(
                            SceneState::CancelAppointment(state),
                            vec![
                                "⚠️ Не удалось отменить запись. Менеджер свяжется с вами для уточнения деталей."
                                    .to_string(),
                            ],
                        )
                        .with_moderator_note(format!(
                            "⚠️ ОШИБКА ОТМЕНЫ записи #{}",
                            selected.id
                        ))
                    }
                }
            }
        }
    }

    async fn find_appointments(
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

fn advance(
    state: CancelState,
    step: CancelStep,
    data: CancelData,
    responses: Vec<String>,
) -> SceneReply {
    debug_assert!(state.step.can_transition_to(&step));
    let _ = state;
    SceneReply::next(
        SceneState::CancelAppointment(CancelState { step, data }),
        responses,
    )
}

fn choices_list_message(appointments: &[CancelChoice]) -> String {
    let mut lines = vec!["📋 Ваши записи (введите номер для отмены):".to_string(), String::new()];
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

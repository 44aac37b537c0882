//! Move-appointment scene.
//!
//! Finds the client's upcoming appointments by phone, then walks through a
//! new date and time. Both are revalidated against freshly recomputed
//! availability for the appointment's clinic, so an offer that went stale
//! between turns is rejected instead of silently booked.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::domain::foundation::{normalize_phone, validate_date, validate_time, StateMachine};
use crate::domain::slots::generate_time_slots;
use crate::ports::Appointment;

use super::common::{format_date_display, is_negative_response, is_positive_response, parse_list_index};
use super::scene::{interpret_step, SceneReply, SceneServices, SceneState, StepVerdict};

/// Clinic-wide fallback window used when composing rebooking offers.
const OFFER_START: (u32, u32) = (9, 0);
const OFFER_END: (u32, u32) = (18, 0);
const OFFER_STEP_MINUTES: u32 = 60;
const OFFER_DAYS_AHEAD: u32 = 14;
const DEFAULT_DURATION_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStep {
    Intro,
    Phone,
    SelectAppointment,
    SelectDate,
    SelectTime,
    Confirmation,
    Completed,
}

impl StateMachine for MoveStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MoveStep::*;
        match self {
            Intro => vec![Phone],
            Phone => vec![SelectAppointment],
            SelectAppointment => vec![SelectDate],
            SelectDate => vec![SelectTime],
            SelectTime => vec![Confirmation],
            Confirmation => vec![Completed],
            Completed => vec![],
        }
    }
}

/// Appointment candidate offered for rescheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentChoice {
    pub id: u64,
    pub admission_date: NaiveDateTime,
    pub clinic_id: u32,
    pub duration_minutes: Option<u32>,
    pub description: Option<String>,
}

impl AppointmentChoice {
    fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            admission_date: appointment.admission_date,
            clinic_id: appointment.clinic_id,
            duration_minutes: appointment.duration_minutes,
            description: appointment.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveData {
    pub phone: Option<String>,
    pub client_id: Option<u64>,
    pub appointments: Vec<AppointmentChoice>,
    pub selected: Option<AppointmentChoice>,
    pub new_date: Option<NaiveDate>,
    pub new_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveState {
    pub step: MoveStep,
    #[serde(default)]
    pub data: MoveData,
}

impl Default for MoveState {
    fn default() -> Self {
        Self {
            step: MoveStep::Intro,
            data: MoveData::default(),
        }
    }
}

pub struct MoveScene<'a> {
    services: &'a SceneServices,
}

impl<'a> MoveScene<'a> {
    pub fn new(services: &'a SceneServices) -> Self {
        Self { services }
    }

    pub fn initial_state() -> MoveState {
        MoveState::default()
    }

    fn step_label(step: MoveStep) -> &'static str {
        match step {
            MoveStep::Intro | MoveStep::Completed => "",
            MoveStep::Phone => "Укажите номер телефона, на который оформлена запись.",
            MoveStep::SelectAppointment => "Выберите запись для переноса (введите номер из списка).",
            MoveStep::SelectDate => "Выберите новую дату приема (введите дату в формате ГГГГ-ММ-ДД).",
            MoveStep::SelectTime => "Выберите новое время приема (введите время в формате ЧЧ:ММ).",
            MoveStep::Confirmation => {
                "Если все верно, ответьте «да» для подтверждения переноса или «нет» для отмены."
            }
        }
    }

    fn format_hint(step: MoveStep) -> Option<&'static str> {
        match step {
            MoveStep::Phone => Some("телефон +7XXXXXXXXXX"),
            MoveStep::SelectDate => Some("ГГГГ-ММ-ДД"),
            MoveStep::SelectTime => Some("ЧЧ:ММ"),
            _ => None,
        }
    }

    pub async fn handle_message(&self, state: MoveState, raw_message: &str) -> SceneReply {
        if state.step == MoveStep::Intro {
            let next = MoveState {
                step: MoveStep::Phone,
                data: state.data,
            };
            return SceneReply::next(
                SceneState::MoveAppointment(next),
                vec![
                    "📅 Перенос записи на прием.\nУкажите номер телефона, на который оформлена запись."
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
                // Hard policy: any detour ends the flow.
                let text = reply.unwrap_or_else(|| {
                    "Хорошо, перенос записи отменен. Если понадобится — напишите снова.".to_string()
                });
                return SceneReply::exit(SceneState::MoveAppointment(state), vec![text]);
            }
            StepVerdict::Answer(value) => value,
        };

        self.handle_step(state, &effective).await
    }

    async fn handle_step(&self, state: MoveState, message: &str) -> SceneReply {
        let mut data = state.data.clone();

        match state.step {
            MoveStep::Intro | MoveStep::Completed => {
                let next = MoveState::default();
                SceneReply::next(
                    SceneState::MoveAppointment(MoveState {
                        step: MoveStep::Phone,
                        ..next
                    }),
                    vec![Self::step_label(MoveStep::Phone).to_string()],
                )
            }

            MoveStep::Phone => {
                let phone = match normalize_phone(message) {
                    Ok(phone) => phone,
                    Err(_) => {
                        return SceneReply::next(
                            SceneState::MoveAppointment(state),
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
                            SceneState::MoveAppointment(state),
                            vec!["Произошла ошибка при поиске записей. Попробуйте позже.".to_string()],
                        )
                    }
                    Ok(None) => SceneReply::exit(
                        SceneState::MoveAppointment(state),
                        vec![format!(
                            "Клиент с номером {} не найден. Проверьте номер или обратитесь к администратору.",
                            phone
                        )],
                    ),
                    Ok(Some((_, appointments))) if appointments.is_empty() => SceneReply::exit(
                        SceneState::MoveAppointment(state),
                        vec!["У вас нет предстоящих записей, которые можно перенести.".to_string()],
                    ),
                    Ok(Some((client_id, appointments))) => {
                        data.phone = Some(phone);
                        data.client_id = Some(client_id);
                        data.appointments = appointments
                            .iter()
                            .map(AppointmentChoice::from_appointment)
                            .collect();
                        let list = appointments_list_message(&data.appointments);
                        advance(state, MoveStep::SelectAppointment, data, vec![list])
                    }
                }
            }

            MoveStep::SelectAppointment => {
                match parse_list_index(message, data.appointments.len()) {
                    None => SceneReply::next(
                        SceneState::MoveAppointment(state.clone()),
                        vec![
                            "Пожалуйста, введите номер записи из списка.".to_string(),
                            appointments_list_message(&state.data.appointments),
                        ],
                    ),
                    Some(index) => {
                        let selected = data.appointments[index].clone();
                        let clinic_id = selected.clinic_id;
                        data.selected = Some(selected);
                        match self.offer_dates(clinic_id).await {
                            Err(err) => {
                                warn!(error = %err, "available dates lookup failed");
                                advance(
                                    state,
                                    MoveStep::SelectDate,
                                    data,
                                    vec![Self::step_label(MoveStep::SelectDate).to_string()],
                                )
                            }
                            Ok(dates) if dates.is_empty() => SceneReply::exit(
                                SceneState::MoveAppointment(state),
                                vec![
                                    "К сожалению, свободных дат для переноса нет. Обратитесь к администратору."
                                        .to_string(),
                                ],
                            ),
                            Ok(dates) => {
                                let list = dates_list_message(&dates, self.services.today());
                                advance(state, MoveStep::SelectDate, data, vec![list])
                            }
                        }
                    }
                }
            }

            MoveStep::SelectDate => {
                let date = match validate_date(message, self.services.today()) {
                    Ok(date) => date,
                    Err(_) => {
                        return SceneReply::next(
                            SceneState::MoveAppointment(state),
                            vec![
                                "Введите дату в формате ГГГГ-ММ-ДД (например, 2025-06-15), не в прошлом."
                                    .to_string(),
                            ],
                        )
                    }
                };
                let clinic_id = data.selected.as_ref().map(|s| s.clinic_id).unwrap_or(1);
                // Revalidate against a fresh availability set: offers go stale.
                match self.offer_dates(clinic_id).await {
                    Ok(dates) if !dates.contains(&date) => SceneReply::next(
                        SceneState::MoveAppointment(state),
                        vec![
                            "Эта дата недоступна для записи.".to_string(),
                            dates_list_message(&dates, self.services.today()),
                        ],
                    ),
                    Err(err) => {
                        warn!(error = %err, "date revalidation failed, accepting user date");
                        data.new_date = Some(date);
                        self.offer_times(state, data, date, clinic_id).await
                    }
                    Ok(_) => {
                        data.new_date = Some(date);
                        self.offer_times(state, data, date, clinic_id).await
                    }
                }
            }

            MoveStep::SelectTime => {
                let time = match validate_time(message) {
                    Ok(time) => time,
                    Err(_) => {
                        return SceneReply::next(
                            SceneState::MoveAppointment(state),
                            vec![
                                "Введите время в формате ЧЧ:ММ (например, 14:30). Приём возможен с 08:00 до 20:00."
                                    .to_string(),
                            ],
                        )
                    }
                };
                let clinic_id = data.selected.as_ref().map(|s| s.clinic_id).unwrap_or(1);
                let Some(date) = data.new_date else {
                    return SceneReply::exit(
                        SceneState::MoveAppointment(state),
                        vec!["Произошла ошибка. Начните перенос заново.".to_string()],
                    );
                };
                match self.free_times(date, clinic_id).await {
                    Ok(free) if !free.contains(&time) => SceneReply::next(
                        SceneState::MoveAppointment(state),
                        vec![
                            "Это время уже занято или недоступно.".to_string(),
                            times_list_message(&free),
                        ],
                    ),
                    Err(err) => {
                        warn!(error = %err, "time revalidation failed, accepting user time");
                        data.new_time = Some(time);
                        self.confirmation_prompt(state, data)
                    }
                    Ok(_) => {
                        data.new_time = Some(time);
                        self.confirmation_prompt(state, data)
                    }
                }
            }

            MoveStep::Confirmation => {
                if is_negative_response(message) {
                    return SceneReply::exit(
                        SceneState::MoveAppointment(state),
                        vec!["Хорошо, перенос записи отменен.".to_string()],
                    );
                }
                if !is_positive_response(message) {
                    return SceneReply::next(
                        SceneState::MoveAppointment(state),
                        vec![
                            "Ответьте, пожалуйста, «да» для подтверждения переноса или «нет» для отмены."
                                .to_string(),
                        ],
                    );
                }
                self.reschedule(state, data).await
            }
        }
    }

    async fn find_appointments(
        &self,
        phone: &str,
    ) -> Result<Option<(u64, Vec<Appointment>)>, crate::domain::foundation::DialogError> {
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
        Ok(Some((client.id, appointments)))
    }

    async fn offer_dates(
        &self,
        clinic_id: u32,
    ) -> Result<Vec<NaiveDate>, crate::domain::foundation::DialogError> {
        self.services
            .booking
            .get_available_dates(OFFER_DAYS_AHEAD, clinic_id)
            .await
    }

    /// Clinic-wide hourly grid minus occupied times for the chosen date.
    async fn free_times(
        &self,
        date: NaiveDate,
        clinic_id: u32,
    ) -> Result<Vec<NaiveTime>, crate::domain::foundation::DialogError> {
        let occupied = self
            .services
            .booking
            .get_occupied_time_slots(date, clinic_id)
            .await?;
        let start = NaiveTime::from_hms_opt(OFFER_START.0, OFFER_START.1, 0).unwrap_or_default();
        let end = NaiveTime::from_hms_opt(OFFER_END.0, OFFER_END.1, 0).unwrap_or_default();
        Ok(generate_time_slots(start, end, OFFER_STEP_MINUTES)
            .into_iter()
            .filter(|t| !occupied.iter().any(|o| o == &t.format("%H:%M").to_string()))
            .collect())
    }

    async fn offer_times(
        &self,
        state: MoveState,
        data: MoveData,
        date: NaiveDate,
        clinic_id: u32,
    ) -> SceneReply {
        let mut responses = vec![format!("✅ Новая дата: {}", date)];
        match self.free_times(date, clinic_id).await {
            Ok(free) if free.is_empty() => {
                return SceneReply::next(
                    SceneState::MoveAppointment(state),
                    vec![
                        "На эту дату свободного времени не осталось. Выберите другую дату."
                            .to_string(),
                    ],
                )
            }
            Ok(free) => responses.push(times_list_message(&free)),
            Err(err) => {
                warn!(error = %err, "occupied slots lookup failed");
                responses.push(Self::step_label(MoveStep::SelectTime).to_string());
            }
        }
        advance(state, MoveStep::SelectTime, data, responses)
    }

    fn confirmation_prompt(&self, state: MoveState, data: MoveData) -> SceneReply {
        let mut responses = Vec::new();
        if let (Some(selected), Some(date), Some(time)) =
            (data.selected.as_ref(), data.new_date, data.new_time)
        {
            responses.push(format!(
                "📋 Перенос записи:\nБыло: {}\nСтанет: {} {}",
                selected.admission_date.format("%Y-%m-%d %H:%M"),
                date,
                time.format("%H:%M")
            ));
        }
        responses.push(Self::step_label(MoveStep::Confirmation).to_string());
        advance(state, MoveStep::Confirmation, data, responses)
    }

    async fn reschedule(&self, state: MoveState, data: MoveData) -> SceneReply {
        let (selected, date, time) = match (data.selected.clone(), data.new_date, data.new_time) {
            (Some(selected), Some(date), Some(time)) => (selected, date, time),
            _ => {
                return SceneReply::exit(
                    SceneState::MoveAppointment(state),
                    vec!["Произошла ошибка. Начните перенос заново.".to_string()],
                )
            }
        };
        let start = date.and_time(time);
        let duration = selected
            .duration_minutes
            .map(i64::from)
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        let end = start + Duration::minutes(duration);

        match self
            .services
            .booking
            .reschedule_appointment(selected.id, selected.clinic_id, start, end)
            .await
        {
            Ok(()) => {
                let next = MoveState {
                    step: MoveStep::Completed,
                    data,
                };
                SceneReply::completed(
                    SceneState::MoveAppointment(next),
                    vec![format!(
                        "✅ Запись перенесена на {} {}.",
                        date,
                        time.format("%H:%M")
                    )],
                )
                .with_moderator_note(format!(
                    "📅 ПЕРЕНОС ЗАПИСИ #{} → {} {}",
                    selected.id,
                    date,
                    time.format("%H:%M")
                ))
            }
            Err(err) => {
                error!(error = %err, appointment = selected.id, "reschedule failed");
                SceneReply::exit(
                    SceneState::MoveAppointment(state),
                    vec![
                        "⚠️ Не удалось перенести запись. Менеджер свяжется с вами для уточнения деталей."
                            .to_string(),
                    ],
                )
                .with_moderator_note(format!(
                    "⚠️ ОШИБКА ПЕРЕНОСА записи #{} на {} {}",
                    selected.id,
                    date,
                    time.format("%H:%M")
                ))
            }
        }
    }
}

fn advance(state: MoveState, step: MoveStep, data: MoveData, responses: Vec<String>) -> SceneReply {
    debug_assert!(state.step.can_transition_to(&step));
    let _ = state;
    SceneReply::next(SceneState::MoveAppointment(MoveState { step, data }), responses)
}

fn appointments_list_message(appointments: &[AppointmentChoice]) -> String {
    let mut lines = vec!["📋 Ваши записи (введите номер для переноса):".to_string(), String::new()];
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

fn dates_list_message(dates: &[NaiveDate], today: NaiveDate) -> String {
    let mut lines = vec!["📅 Доступные даты (введите дату в формате ГГГГ-ММ-ДД):".to_string(), String::new()];
    for date in dates {
        lines.push(format!("• {} ({})", date, format_date_display(*date, today)));
    }
    lines.join("\n")
}

fn times_list_message(times: &[NaiveTime]) -> String {
    let mut lines = vec!["🕐 Свободное время (введите время в формате ЧЧ:ММ):".to_string(), String::new()];
    for time in times {
        lines.push(format!("• {}", time.format("%H:%M")));
    }
    lines.join("\n")
}

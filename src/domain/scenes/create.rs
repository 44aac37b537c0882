//! Create-appointment scene.
//!
//! The longest flow: symptoms, pet, owner contact, appointment type, doctor
//! and slot selection, then a confirmation that performs the booking chain.
//! A booking failure degrades to a human-follow-up message; the
//! conversation itself never fails at that point.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::domain::foundation::{
    best_match, normalize_phone, validate_date, validate_time, StateMachine, ValidationError,
};
use crate::domain::slots::{
    available_slots, AppointmentType, AvailabilityOutcome, AvailableSlot, OccupiedSet, SlotQuery,
};
use crate::ports::{CreateAppointment, Doctor};

use super::common::{is_negative_response, is_positive_response, split_name};
use super::scene::{interpret_step, SceneReply, SceneServices, SceneState, StepVerdict};

/// Default clinic until multi-clinic booking is exposed to users.
const DEFAULT_CLINIC_ID: u32 = 1;
const DEFAULT_CLINIC_LABEL: &str = "Клиника #1";

/// CRM defaults for pets created on the fly.
const DEFAULT_PET_TYPE_ID: u32 = 2;
const DEFAULT_PET_BREED_ID: u32 = 2;

const WAITLIST_HINT: &str = "Если нужна запись к этому врачу — можно встать в лист ожидания; \
при освобождении окна с вами свяжутся. Сроки не гарантируем. Напишите «лист ожидания», \
чтобы передать заявку администратору.";

/// Steps of the create-appointment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStep {
    Intro,
    Symptoms,
    PetName,
    PetBreed,
    OwnerPhone,
    OwnerName,
    AppointmentType,
    AppointmentTypeOther,
    Doctor,
    SlotSelection,
    Date,
    Time,
    Confirmation,
    Completed,
}

impl StateMachine for CreateStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CreateStep::*;
        match self {
            Intro => vec![Symptoms],
            Symptoms => vec![PetName],
            PetName => vec![PetBreed],
            PetBreed => vec![OwnerPhone],
            OwnerPhone => vec![OwnerName],
            OwnerName => vec![AppointmentType],
            AppointmentType => vec![AppointmentTypeOther, Doctor],
            AppointmentTypeOther => vec![Doctor],
            Doctor => vec![SlotSelection, Date],
            SlotSelection => vec![Confirmation],
            Date => vec![Time],
            Time => vec![Confirmation],
            // Negative confirmation restarts at symptoms.
            Confirmation => vec![Completed, Symptoms],
            Completed => vec![],
        }
    }
}

/// Scene-local collected data. Fields fill incrementally and are never
/// removed within one flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateData {
    pub symptoms: Option<String>,
    pub pet_name: Option<String>,
    pub pet_breed: Option<String>,
    pub owner_phone: Option<String>,
    pub owner_name: Option<String>,
    pub appointment_type: Option<AppointmentType>,
    pub appointment_type_other: Option<String>,
    pub doctor: Option<String>,
    pub doctor_id: Option<u64>,
    pub doctor_last_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub clinic_id: Option<u32>,
    /// Slots offered at the last slot_selection prompt, in display order.
    pub available_slots: Vec<AvailableSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateState {
    pub step: CreateStep,
    #[serde(default)]
    pub data: CreateData,
}

impl Default for CreateState {
    fn default() -> Self {
        Self {
            step: CreateStep::Intro,
            data: CreateData::default(),
        }
    }
}

pub struct CreateScene<'a> {
    services: &'a SceneServices,
}

impl<'a> CreateScene<'a> {
    pub fn new(services: &'a SceneServices) -> Self {
        Self { services }
    }

    pub fn initial_state() -> CreateState {
        CreateState::default()
    }

    fn step_label(step: CreateStep) -> &'static str {
        match step {
            CreateStep::Intro | CreateStep::Completed => "",
            CreateStep::Symptoms => "Расскажите, пожалуйста, какие симптомы у питомца.",
            CreateStep::PetName => "Укажите имя и вид питомца (например: Барсик, кот).",
            CreateStep::PetBreed => "Введите породу питомца (например: британская, корги).",
            CreateStep::OwnerPhone => "Укажите номер телефона владельца в формате +7XXXXXXXXXX.",
            CreateStep::OwnerName => "Введите ФИО владельца (например: Иванов Иван Иванович).",
            CreateStep::AppointmentType => {
                "Выберите тип приема: 1 — первичный, 2 — вторичный, 3 — прививка, 4 — УЗИ, \
                 5 — анализы, 6 — рентген, 7 — другое (произвольная причина)."
            }
            CreateStep::AppointmentTypeOther => "Укажите причину приёма (произвольный текст).",
            CreateStep::Doctor => {
                "Укажите предпочитаемого врача (ФИО) или напишите «авто» для автоматического подбора."
            }
            CreateStep::SlotSelection => "Выберите доступное окно (введите номер из списка).",
            CreateStep::Date => {
                "Введите желаемую дату приема в формате ГГГГ-ММ-ДД (например, 2025-06-15)."
            }
            CreateStep::Time => {
                "Введите время приема в формате ЧЧ:ММ (например, 14:30). Приём возможен с 08:00 до 20:00."
            }
            CreateStep::Confirmation => {
                "Если данные верны, ответьте «да» для подтверждения или «нет», чтобы начать заново."
            }
        }
    }

    fn format_hint(step: CreateStep) -> Option<&'static str> {
        match step {
            CreateStep::OwnerPhone => Some("телефон +7XXXXXXXXXX"),
            CreateStep::Date => Some("ГГГГ-ММ-ДД"),
            CreateStep::Time => Some("ЧЧ:ММ"),
            CreateStep::AppointmentType => {
                Some("1-7 или primary/secondary/vaccination/ultrasound/analyses/xray/other")
            }
            _ => None,
        }
    }

    pub async fn handle_message(&self, state: CreateState, raw_message: &str) -> SceneReply {
        if state.step == CreateStep::Intro {
            let next = CreateState {
                step: CreateStep::Symptoms,
                data: state.data,
            };
            return SceneReply::next(
                SceneState::CreateAppointment(next),
                vec![intro_message()],
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
            StepVerdict::Refuse(reply) => {
                let text = reply.unwrap_or_else(|| {
                    "Хорошо, запись отменена. Если понадобится — напишите снова.".to_string()
                });
                return SceneReply::exit(SceneState::CreateAppointment(state), vec![text]);
            }
            // Soft policy: this scene re-prompts the same step instead of exiting.
            StepVerdict::OffTopic(reply) => {
                let mut responses = vec![reply.unwrap_or_else(|| {
                    "Давайте сначала закончим оформление записи.".to_string()
                })];
                responses.push(Self::step_label(state.step).to_string());
                return SceneReply::next(SceneState::CreateAppointment(state), responses);
            }
            StepVerdict::Answer(value) => value,
        };

        self.handle_step(state, &effective).await
    }

    async fn handle_step(&self, state: CreateState, message: &str) -> SceneReply {
        let mut data = state.data.clone();
        let mut responses: Vec<String> = Vec::new();

        let reprompt = |responses: Vec<String>| {
            SceneReply::next(SceneState::CreateAppointment(state.clone()), responses)
        };

        match state.step {
            CreateStep::Intro | CreateStep::Completed => {
                let next = CreateState {
                    step: CreateStep::Symptoms,
                    data: CreateData::default(),
                };
                SceneReply::next(SceneState::CreateAppointment(next), vec![intro_message()])
            }

            CreateStep::Symptoms => {
                data.symptoms = Some(message.to_string());
                responses.push(format!("✅ Симптомы: {}", message));
                responses.push("Теперь укажите имя и вид питомца (например: «Барсик, кот»).".to_string());
                advance(state, CreateStep::PetName, data, responses)
            }

            CreateStep::PetName => {
                data.pet_name = Some(message.to_string());
                responses.push(format!("✅ Питомец: {}", message));
                responses.push("Введите породу питомца (например: «британская», «корги»).".to_string());
                advance(state, CreateStep::PetBreed, data, responses)
            }

            CreateStep::PetBreed => {
                data.pet_breed = Some(message.to_string());
                responses.push(format!(
                    "✅ Питомец: {}",
                    data.pet_name.as_deref().unwrap_or("питомец")
                ));
                responses.push(format!("✅ Порода: {}", message));
                responses.push("Укажите номер телефона владельца в формате +7XXXXXXXXXX.".to_string());
                advance(state, CreateStep::OwnerPhone, data, responses)
            }

            CreateStep::OwnerPhone => match normalize_phone(message) {
                Ok(phone) => {
                    responses.push(format!("✅ Телефон владельца: {}", phone));
                    responses.push("Введите ФИО владельца (например: «Иванов Иван Иванович»).".to_string());
                    data.owner_phone = Some(phone);
                    advance(state, CreateStep::OwnerName, data, responses)
                }
                Err(_) => reprompt(vec![
                    "Не удалось распознать номер телефона. Введите его в формате +7XXXXXXXXXX."
                        .to_string(),
                ]),
            },

            CreateStep::OwnerName => {
                data.owner_name = Some(message.to_string());
                responses.push(format!("✅ ФИО: {}", message));
                responses.push(Self::step_label(CreateStep::AppointmentType).to_string());
                advance(state, CreateStep::AppointmentType, data, responses)
            }

            CreateStep::AppointmentType => match AppointmentType::parse(message) {
                None => reprompt(vec![format!(
                    "Пожалуйста, выберите тип приема. {}",
                    Self::step_label(CreateStep::AppointmentType)
                )]),
                Some(AppointmentType::Other) => {
                    data.appointment_type = Some(AppointmentType::Other);
                    responses.push("✅ Тип приема: другое (произвольная причина)".to_string());
                    responses.push("Укажите причину приёма (произвольный текст).".to_string());
                    advance(state, CreateStep::AppointmentTypeOther, data, responses)
                }
                Some(appointment_type) => {
                    data.appointment_type = Some(appointment_type);
                    responses.push(format!("✅ Тип приема: {}", appointment_type.label()));
                    responses.push(self.doctor_prompt().await);
                    advance(state, CreateStep::Doctor, data, responses)
                }
            },

            CreateStep::AppointmentTypeOther => {
                if message.is_empty() {
                    return reprompt(vec![
                        "Пожалуйста, укажите причину приёма (произвольный текст).".to_string(),
                    ]);
                }
                data.appointment_type_other = Some(message.to_string());
                responses.push(format!("✅ Причина приёма: {}", message));
                responses.push(self.doctor_prompt().await);
                advance(state, CreateStep::Doctor, data, responses)
            }

            CreateStep::Doctor => self.handle_doctor_step(state, data, message).await,

            CreateStep::SlotSelection => {
                let slots = data.available_slots.clone();
                let index = message.trim().parse::<usize>().ok();
                let chosen = index
                    .filter(|n| *n >= 1 && *n <= slots.len())
                    .map(|n| slots[n - 1].clone());
                match chosen {
                    None => {
                        let mut out =
                            vec!["Пожалуйста, введите номер окна из списка.".to_string()];
                        if !slots.is_empty() {
                            out.push(slots_list_message(&slots));
                        }
                        reprompt(out)
                    }
                    Some(slot) => {
                        data.date = Some(slot.date);
                        data.time = Some(slot.time);
                        data.clinic_id = Some(DEFAULT_CLINIC_ID);
                        responses.push(format!(
                            "✅ Выбрано окно: {} {}",
                            slot.date,
                            slot.time.format("%H:%M")
                        ));
                        responses.push(format!("✅ Клиника: {}", DEFAULT_CLINIC_LABEL));
                        responses.push(summary_message(&data));
                        responses.push(Self::step_label(CreateStep::Confirmation).to_string());
                        advance(state, CreateStep::Confirmation, data, responses)
                    }
                }
            }

            CreateStep::Date => match validate_date(message, self.services.today()) {
                Err(err) => reprompt(vec![date_error_message(&err)]),
                Ok(date) => {
                    data.date = Some(date);
                    responses.push(format!("✅ Дата приема: {}", date));
                    responses.push("Введите желаемое время приема в формате ЧЧ:ММ.".to_string());
                    advance(state, CreateStep::Time, data, responses)
                }
            },

            CreateStep::Time => match validate_time(message) {
                Err(err) => reprompt(vec![time_error_message(&err)]),
                Ok(time) => {
                    data.time = Some(time);
                    data.clinic_id = Some(DEFAULT_CLINIC_ID);
                    responses.push(format!("✅ Время приема: {}", time.format("%H:%M")));
                    responses.push(format!("✅ Клиника: {}", DEFAULT_CLINIC_LABEL));
                    responses.push(summary_message(&data));
                    responses.push(Self::step_label(CreateStep::Confirmation).to_string());
                    advance(state, CreateStep::Confirmation, data, responses)
                }
            },

            CreateStep::Confirmation => {
                if is_positive_response(message) {
                    return self.handle_confirmation(state, data).await;
                }
                if is_negative_response(message) {
                    let next = CreateState {
                        step: CreateStep::Symptoms,
                        data: CreateData::default(),
                    };
                    return SceneReply::next(
                        SceneState::CreateAppointment(next),
                        vec!["Хорошо, начнем заново.".to_string(), intro_message()],
                    );
                }
                reprompt(vec![
                    "Ответьте, пожалуйста, «да» для подтверждения или «нет», чтобы начать заново."
                        .to_string(),
                ])
            }
        }
    }

    async fn handle_doctor_step(
        &self,
        state: CreateState,
        mut data: CreateData,
        message: &str,
    ) -> SceneReply {
        let mut responses: Vec<String> = Vec::new();

        if let Ok(number) = message.trim().parse::<usize>() {
            let roster = match self.roster().await {
                Ok(roster) => roster,
                Err(err) => {
                    error!(error = %err, "failed to load doctor roster");
                    return SceneReply::next(
                        SceneState::CreateAppointment(state),
                        vec![
                            "Произошла ошибка при получении информации о враче. Попробуйте снова."
                                .to_string(),
                        ],
                    );
                }
            };
            let Some(doctor) = number.checked_sub(1).and_then(|i| roster.get(i)) else {
                let mut out = vec![format!(
                    "❌ Врач с номером {} не найден. Выберите номер из списка.",
                    number
                )];
                if let Some(list) = doctors_list_message(&roster) {
                    out.push(list);
                }
                return SceneReply::next(SceneState::CreateAppointment(state), out);
            };

            data.doctor = Some(doctor.display_name());
            data.doctor_id = Some(doctor.id);
            data.doctor_last_name = Some(doctor.roster_last_name());
            let mut chosen = format!("✅ Выбран врач: {}", doctor.display_name());
            if let Some(position) = doctor.position.as_deref().filter(|p| !p.trim().is_empty()) {
                chosen.push_str(&format!(" ({})", position));
            }
            responses.push(chosen);

            return self
                .offer_slots_or_fallback(state, data, responses, true)
                .await;
        }

        data.doctor = Some(message.to_string());
        if message.trim().to_lowercase() == "авто" {
            responses.push("✅ Врач: Автоматический подбор".to_string());
            responses.push(Self::step_label(CreateStep::Date).to_string());
            return advance(state, CreateStep::Date, data, responses);
        }

        let last_name = message
            .split_whitespace()
            .next()
            .unwrap_or(message)
            .to_string();
        // Resolve the CRM doctor id so occupied times can be subtracted.
        if let Ok(roster) = self.roster().await {
            let names: Vec<(u64, String)> =
                roster.iter().map(|d| (d.id, d.roster_last_name())).collect();
            if let Some((id, _)) = best_match(&last_name, &names, |(_, name)| name.as_str()) {
                data.doctor_id = Some(*id);
            }
        }
        data.doctor_last_name = Some(last_name);
        responses.push(format!("✅ Выбран врач: {}", message));
        self.offer_slots_or_fallback(state, data, responses, false)
            .await
    }

    /// Queries availability for the resolved doctor; on success moves to
    /// slot selection, otherwise falls back per the entry path.
    async fn offer_slots_or_fallback(
        &self,
        state: CreateState,
        mut data: CreateData,
        mut responses: Vec<String>,
        retry_doctor_on_empty: bool,
    ) -> SceneReply {
        let last_name = data.doctor_last_name.clone().unwrap_or_default();
        match self.availability(&last_name, data.doctor_id, data.appointment_type).await {
            Ok(AvailabilityOutcome::Available(slots)) => {
                responses.push(slots_list_message(&slots));
                data.available_slots = slots;
                advance(state, CreateStep::SlotSelection, data, responses)
            }
            Ok(outcome) => {
                match outcome {
                    AvailabilityOutcome::NotRostered => responses.push(
                        "Врач не указан в расписании ни на одну дату. Возможно, он работает \
                         только по живой очереди или не ведет прием по записи."
                            .to_string(),
                    ),
                    _ => responses.push(
                        "К сожалению, у выбранного врача нет доступных окон для записи."
                            .to_string(),
                    ),
                }
                responses.push(WAITLIST_HINT.to_string());
                if retry_doctor_on_empty {
                    responses.push("Попробуйте выбрать другого врача.".to_string());
                    if let Ok(roster) = self.roster().await {
                        if let Some(list) = doctors_list_message(&roster) {
                            responses.push(list);
                        }
                    }
                    SceneReply::next(SceneState::CreateAppointment(state), responses)
                } else {
                    responses.push(Self::step_label(CreateStep::Date).to_string());
                    advance(state, CreateStep::Date, data, responses)
                }
            }
            Err(err) => {
                warn!(error = %err, "slot availability lookup failed");
                responses.push("Не удалось получить доступные окна.".to_string());
                responses.push(Self::step_label(CreateStep::Date).to_string());
                advance(state, CreateStep::Date, data, responses)
            }
        }
    }

    async fn availability(
        &self,
        last_name: &str,
        doctor_id: Option<u64>,
        appointment_type: Option<AppointmentType>,
    ) -> Result<AvailabilityOutcome, crate::domain::foundation::DialogError> {
        let rules = self.services.rules.current().await?;
        let occupied: OccupiedSet = match doctor_id {
            Some(id) => self
                .services
                .booking
                .get_doctor_occupied_times(id)
                .await?
                .into_iter()
                .map(|dt| {
                    let time = NaiveTime::from_hms_opt(
                        chrono::Timelike::hour(&dt.time()),
                        chrono::Timelike::minute(&dt.time()),
                        0,
                    )
                    .unwrap_or(dt.time());
                    (dt.date(), time)
                })
                .collect(),
            None => OccupiedSet::new(),
        };
        let query = SlotQuery {
            doctor_last_name: last_name.to_string(),
            explicit_date: None,
            appointment_type: appointment_type.unwrap_or(AppointmentType::Primary),
            today: self.services.today(),
        };
        Ok(available_slots(&query, rules.as_ref(), &occupied))
    }

    async fn roster(&self) -> Result<Vec<Doctor>, crate::domain::foundation::DialogError> {
        let doctors = self.services.booking.get_doctors_with_appointment().await?;
        Ok(filter_non_admin_doctors(doctors))
    }

    async fn doctor_prompt(&self) -> String {
        match self.roster().await {
            Ok(roster) => doctors_list_message(&roster)
                .unwrap_or_else(|| Self::step_label(CreateStep::Doctor).to_string()),
            Err(err) => {
                warn!(error = %err, "failed to load doctor roster for prompt");
                Self::step_label(CreateStep::Doctor).to_string()
            }
        }
    }

    /// Positive confirmation: run the booking chain. Failures degrade to a
    /// human-follow-up message but still complete the scene.
    async fn handle_confirmation(&self, state: CreateState, data: CreateData) -> SceneReply {
        let mut responses: Vec<String> = Vec::new();

        // A named doctor is optional: auto-assignment books without one.
        let bookable =
            data.owner_phone.is_some() && data.date.is_some() && data.time.is_some();

        let mut booked = false;
        if bookable {
            match self.book(&data).await {
                Ok(()) => {
                    booked = true;
                    responses.push("✅ Запись успешно создана в системе!".to_string());
                }
                Err(err) => {
                    error!(error = %err, "booking chain failed");
                    responses.push(
                        "⚠️ Заявка сформирована, но произошла ошибка при создании записи в системе. \
                         Менеджер свяжется с вами для уточнения деталей."
                            .to_string(),
                    );
                }
            }
        }
        responses.push(
            "Заявка сформирована и будет обработана менеджером. Благодарим за обращение!"
                .to_string(),
        );
        responses.push(summary_message(&data));

        let note = format!(
            "📋 НОВАЯ ЗАЯВКА{}\n{}",
            if booked { "" } else { " (требует ручной обработки)" },
            summary_message(&data)
        );
        let next = CreateState {
            step: CreateStep::Completed,
            data,
        };
        SceneReply::completed(SceneState::CreateAppointment(next), responses)
            .with_moderator_note(note)
    }

    async fn book(&self, data: &CreateData) -> Result<(), crate::domain::foundation::DialogError> {
        let booking = &self.services.booking;
        let phone = data
            .owner_phone
            .as_deref()
            .ok_or_else(|| ValidationError::empty_field("owner_phone"))?;
        let (date, time) = match (data.date, data.time) {
            (Some(date), Some(time)) => (date, time),
            _ => return Err(ValidationError::empty_field("date").into()),
        };

        let client_id = match booking.get_client_by_phone(phone).await? {
            Some(client) => client.id,
            None => {
                let (last, first, middle) = split_name(data.owner_name.as_deref().unwrap_or(""));
                let last = if last.is_empty() { "Не указано".to_string() } else { last };
                let first = if first.is_empty() { "Не указано".to_string() } else { first };
                booking.create_client(&last, &first, &middle, phone).await?.id
            }
        };

        let pet_name = data.pet_name.as_deref().unwrap_or("Питомец");
        let patient_id = booking
            .create_pet(client_id, pet_name, DEFAULT_PET_TYPE_ID, DEFAULT_PET_BREED_ID)
            .await?;

        let appointment_type = data.appointment_type.unwrap_or(AppointmentType::Primary);
        let symptoms = data
            .symptoms
            .clone()
            .unwrap_or_else(|| "Запись через чат-бота".to_string());
        let description = match (&data.appointment_type, &data.appointment_type_other) {
            (Some(AppointmentType::Other), Some(reason)) => {
                format!("{}. Причина: {}", symptoms, reason)
            }
            _ => symptoms,
        };

        booking
            .create_appointment(&CreateAppointment {
                type_id: appointment_type.type_id(),
                admission_date: date.and_time(time),
                clinic_id: data.clinic_id.unwrap_or(DEFAULT_CLINIC_ID),
                client_id,
                patient_id,
                description,
                duration_minutes: appointment_type.duration_minutes(),
                doctor_id: data.doctor_id,
            })
            .await
    }
}

fn advance(
    state: CreateState,
    step: CreateStep,
    data: CreateData,
    responses: Vec<String>,
) -> SceneReply {
    debug_assert!(state.step.can_transition_to(&step));
    let _ = state;
    SceneReply::next(
        SceneState::CreateAppointment(CreateState { step, data }),
        responses,
    )
}

fn intro_message() -> String {
    [
        "🐾 Создание записи на прием",
        "",
        "Расскажите, пожалуйста, какие симптомы у питомца. Это будет первым шагом.",
        "Вы всегда можете отправить «/exit», чтобы отменить процесс.",
    ]
    .join("\n")
}

/// Drops administrators and untitled staff from the bookable roster.
pub fn filter_non_admin_doctors(doctors: Vec<Doctor>) -> Vec<Doctor> {
    doctors
        .into_iter()
        .filter(|d| {
            let position = d.position.as_deref().unwrap_or("").trim().to_lowercase();
            !position.is_empty()
                && !position.contains("администратор")
                && !position.contains("administrator")
        })
        .collect()
}

fn doctors_list_message(roster: &[Doctor]) -> Option<String> {
    if roster.is_empty() {
        return None;
    }
    let mut lines = vec!["👨‍⚕️ Выберите врача (введите номер):".to_string(), String::new()];
    for (i, doctor) in roster.iter().enumerate() {
        let mut line = format!("{}. {}", i + 1, doctor.display_name());
        if let Some(position) = doctor.position.as_deref().filter(|p| !p.trim().is_empty()) {
            line.push_str(&format!(" ({})", position));
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push("Или введите ФИО врача или «авто» для автоматического подбора.".to_string());
    Some(lines.join("\n"))
}

fn slots_list_message(slots: &[AvailableSlot]) -> String {
    let mut lines = vec!["📅 Выберите доступное окно (введите номер):".to_string(), String::new()];
    let mut current_date: Option<NaiveDate> = None;
    for (i, slot) in slots.iter().enumerate() {
        if current_date != Some(slot.date) {
            if current_date.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("📅 {}:", slot.date));
            current_date = Some(slot.date);
        }
        lines.push(format!("   {}. {}", i + 1, slot.time.format("%H:%M")));
    }
    lines.join("\n")
}

fn summary_message(data: &CreateData) -> String {
    let mut lines = vec!["📋 Сводка заявки:".to_string()];
    if let Some(pet) = &data.pet_name {
        let breed = data
            .pet_breed
            .as_deref()
            .map(|b| format!(" ({})", b))
            .unwrap_or_default();
        lines.push(format!("🐾 Питомец: {}{}", pet, breed));
    }
    if let Some(symptoms) = &data.symptoms {
        lines.push(format!("⚕️ Симптомы: {}", symptoms));
    }
    if let Some(owner) = &data.owner_name {
        lines.push(format!("👤 Владелец: {}", owner));
    }
    if let Some(phone) = &data.owner_phone {
        lines.push(format!("📞 Телефон: {}", phone));
    }
    if let Some(appointment_type) = data.appointment_type {
        let label = match (&appointment_type, &data.appointment_type_other) {
            (AppointmentType::Other, Some(reason)) => format!("Другое: {}", reason),
            _ => appointment_type.label().to_string(),
        };
        lines.push(format!("🩺 Тип приема: {}", label));
    }
    match (data.date, data.time) {
        (Some(date), Some(time)) => {
            lines.push(format!("📅 Дата и время: {} {}", date, time.format("%H:%M")))
        }
        (Some(date), None) => lines.push(format!("📅 Дата: {}", date)),
        _ => {}
    }
    if let Some(doctor) = &data.doctor {
        let label = if doctor.to_lowercase() == "авто" {
            "Автоматический подбор"
        } else {
            doctor.as_str()
        };
        lines.push(format!("👨‍⚕️ Врач: {}", label));
    }
    lines.join("\n")
}

fn date_error_message(err: &ValidationError) -> String {
    match err {
        ValidationError::InvalidFormat { reason, .. } if reason.contains("past") => {
            "Дата не должна быть в прошлом. Введите актуальную или будущую дату в формате ГГГГ-ММ-ДД."
                .to_string()
        }
        ValidationError::InvalidFormat { reason, .. } if reason.contains("ahead") => {
            "Запись возможна не более чем на 12 месяцев вперёд. Выберите более близкую дату."
                .to_string()
        }
        _ => "Введите дату в формате ГГГГ-ММ-ДД (например, 2025-06-15).".to_string(),
    }
}

fn time_error_message(err: &ValidationError) -> String {
    match err {
        ValidationError::InvalidFormat { reason, .. } if reason.contains("working hours") => {
            "Время приёма — с 08:00 до 20:00. Введите время в этом диапазоне.".to_string()
        }
        _ => "Введите время в формате ЧЧ:ММ (например, 14:30). Приём возможен с 08:00 до 20:00."
            .to_string(),
    }
}

//! Integration tests for complete dialog flows.
//!
//! These tests drive the orchestrator end to end with an in-memory session
//! store and a mock booking client:
//! 1. Intent classification starts the right scene
//! 2. Multi-turn flows collect data and complete
//! 3. Session state survives across turns and is cleared on completion

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use clinic_dialog::adapters::{InMemorySessionStore, TracingModeratorNotifier};
use clinic_dialog::application::DialogOrchestrator;
use clinic_dialog::domain::foundation::DialogError;
use clinic_dialog::domain::scenes::SceneServices;
use clinic_dialog::domain::slots::ClinicRules;
use clinic_dialog::ports::{
    Appointment, BookingClient, ClinicRulesProvider, CreateAppointment, CrmClient, Doctor,
    SessionStore,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Mock booking client backed by plain vectors.
#[derive(Default)]
struct MockBookingClient {
    clients: Mutex<Vec<(CrmClient, String)>>,
    appointments: Mutex<Vec<Appointment>>,
    created: Mutex<Vec<CreateAppointment>>,
    cancelled: Mutex<Vec<u64>>,
    confirmed: Mutex<Vec<u64>>,
}

impl MockBookingClient {
    fn with_client(self, id: u64, name: &str, phone: &str) -> Self {
        self.clients.lock().unwrap().push((
            CrmClient {
                id,
                name: Some(name.to_string()),
            },
            phone.to_string(),
        ));
        self
    }

    fn with_appointment(self, id: u64, client_id: u64, date: NaiveDateTime) -> Self {
        self.appointments.lock().unwrap().push(Appointment {
            id,
            admission_date: date,
            clinic_id: 1,
            client_id,
            patient_id: 1,
            doctor_id: Some(7),
            type_id: Some(1),
            duration_minutes: Some(30),
            description: Some("Прием".to_string()),
            status: None,
        });
        self
    }
}

#[async_trait]
impl BookingClient for MockBookingClient {
    async fn get_client_by_phone(&self, phone: &str) -> Result<Option<CrmClient>, DialogError> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|(_, p)| p == phone)
            .map(|(c, _)| c.clone()))
    }

    async fn create_client(
        &self,
        last_name: &str,
        _first_name: &str,
        _middle_name: &str,
        phone: &str,
    ) -> Result<CrmClient, DialogError> {
        let client = CrmClient {
            id: 1000,
            name: Some(last_name.to_string()),
        };
        self.clients
            .lock()
            .unwrap()
            .push((client.clone(), phone.to_string()));
        Ok(client)
    }

    async fn create_pet(
        &self,
        _client_id: u64,
        _name: &str,
        _type_id: u32,
        _breed_id: u32,
    ) -> Result<u64, DialogError> {
        Ok(500)
    }

    async fn get_doctors_with_appointment(&self) -> Result<Vec<Doctor>, DialogError> {
        Ok(vec![Doctor {
            id: 7,
            last_name: Some("Иванова".to_string()),
            first_name: Some("Анна".to_string()),
            position: Some("Терапевт".to_string()),
            ..Doctor::default()
        }])
    }

    async fn get_doctor_occupied_times(
        &self,
        _doctor_id: u64,
    ) -> Result<Vec<NaiveDateTime>, DialogError> {
        Ok(Vec::new())
    }

    async fn get_client_appointments(
        &self,
        client_id: u64,
    ) -> Result<Vec<Appointment>, DialogError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn create_appointment(&self, request: &CreateAppointment) -> Result<(), DialogError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn reschedule_appointment(
        &self,
        _id: u64,
        _clinic_id: u32,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<(), DialogError> {
        Ok(())
    }

    async fn cancel_appointment(&self, id: u64) -> Result<(), DialogError> {
        self.cancelled.lock().unwrap().push(id);
        Ok(())
    }

    async fn confirm_appointment(&self, id: u64) -> Result<(), DialogError> {
        self.confirmed.lock().unwrap().push(id);
        Ok(())
    }

    async fn get_available_dates(
        &self,
        days_ahead: u32,
        _clinic_id: u32,
    ) -> Result<Vec<NaiveDate>, DialogError> {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        Ok((0..days_ahead as u64)
            .map(|d| start + chrono::Duration::days(d as i64))
            .collect())
    }

    async fn get_occupied_time_slots(
        &self,
        _date: NaiveDate,
        _clinic_id: u32,
    ) -> Result<Vec<String>, DialogError> {
        Ok(Vec::new())
    }
}

/// Rules provider with no document (slot engine fallback mode).
struct NoRules;

#[async_trait]
impl ClinicRulesProvider for NoRules {
    async fn current(&self) -> Result<Option<ClinicRules>, DialogError> {
        Ok(None)
    }
}

fn build(booking: MockBookingClient) -> (DialogOrchestrator, Arc<InMemorySessionStore>, Arc<MockBookingClient>) {
    let store = Arc::new(InMemorySessionStore::new());
    let booking = Arc::new(booking);
    let services = SceneServices::new(booking.clone(), Arc::new(NoRules))
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    let orchestrator = DialogOrchestrator::new(
        store.clone(),
        services,
        Arc::new(TracingModeratorNotifier::new()),
    );
    (orchestrator, store, booking)
}

async fn say(orchestrator: &DialogOrchestrator, text: &str) -> Vec<String> {
    orchestrator.handle_message("tg-100", text).await
}

// =============================================================================
// Create flow
// =============================================================================

#[tokio::test]
async fn create_flow_collects_data_and_completes() {
    let (orchestrator, store, _) = build(MockBookingClient::default());

    let replies = say(&orchestrator, "хочу записаться на прием").await;
    assert!(replies.iter().any(|r| r.contains("симптомы")));
    assert!(store.has_session("tg-100"));

    say(&orchestrator, "у кота рвота").await;
    say(&orchestrator, "Барсик, кот").await;
    say(&orchestrator, "британская").await;

    let replies = say(&orchestrator, "+79001234567").await;
    assert!(replies.iter().any(|r| r.contains("+79001234567")));

    say(&orchestrator, "Иванов Иван Иванович").await;

    // Type 1 = primary; the doctor prompt lists the roster.
    let replies = say(&orchestrator, "1").await;
    assert!(replies.iter().any(|r| r.contains("первичный")));

    // Automatic doctor selection skips the slot engine and asks for a date.
    let replies = say(&orchestrator, "авто").await;
    assert!(replies.iter().any(|r| r.contains("ГГГГ-ММ-ДД")));

    say(&orchestrator, "2025-06-15").await;
    let replies = say(&orchestrator, "14:30").await;
    assert!(replies.iter().any(|r| r.contains("14:30")));
    assert!(replies.iter().any(|r| r.contains("да")));

    let replies = say(&orchestrator, "да").await;
    assert!(replies
        .iter()
        .any(|r| r.contains("Заявка сформирована")));

    // Completed scene is cleared from the store.
    assert!(!store.has_session("tg-100"));
}

#[tokio::test]
async fn create_flow_rejects_malformed_phone_and_stays_on_step() {
    let (orchestrator, store, _) = build(MockBookingClient::default());

    say(&orchestrator, "хочу записаться").await;
    say(&orchestrator, "кашель").await;
    say(&orchestrator, "Рекс, собака").await;
    say(&orchestrator, "овчарка").await;

    let replies = say(&orchestrator, "номер не скажу").await;
    assert!(replies.iter().any(|r| r.contains("+7XXXXXXXXXX")));
    assert!(store.has_session("tg-100"));

    // A valid phone is accepted afterwards.
    let replies = say(&orchestrator, "8 (900) 123-45-67").await;
    assert!(replies.iter().any(|r| r.contains("+79001234567")));
}

// =============================================================================
// Cancel flow
// =============================================================================

#[tokio::test]
async fn cancel_flow_cancels_selected_appointment() {
    let date = NaiveDate::from_ymd_opt(2025, 6, 10)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap();
    let booking = MockBookingClient::default()
        .with_client(55, "Петров", "+79001234567")
        .with_appointment(301, 55, date);
    let (orchestrator, store, booking) = build(booking);

    let replies = say(&orchestrator, "хочу отменить запись").await;
    assert!(replies.iter().any(|r| r.contains("Отмена записи")));

    let replies = say(&orchestrator, "+79001234567").await;
    assert!(replies.iter().any(|r| r.contains("2025-06-10")));

    say(&orchestrator, "1").await;
    let replies = say(&orchestrator, "да").await;
    assert!(replies.iter().any(|r| r.contains("Запись отменена")));
    assert_eq!(*booking.cancelled.lock().unwrap(), vec![301]);
    assert!(!store.has_session("tg-100"));
}

#[tokio::test]
async fn cancel_flow_exits_for_unknown_phone() {
    let (orchestrator, store, booking) = build(MockBookingClient::default());

    say(&orchestrator, "отменить запись").await;
    let replies = say(&orchestrator, "+79009999999").await;
    assert!(replies.iter().any(|r| r.contains("не найден")));
    assert!(booking.cancelled.lock().unwrap().is_empty());
    assert!(!store.has_session("tg-100"));
}

// =============================================================================
// Show flow
// =============================================================================

#[tokio::test]
async fn show_flow_lists_upcoming_appointments() {
    let date = NaiveDate::from_ymd_opt(2025, 6, 20)
        .unwrap()
        .and_hms_opt(11, 30, 0)
        .unwrap();
    let booking = MockBookingClient::default()
        .with_client(55, "Петров", "+79001234567")
        .with_appointment(302, 55, date);
    let (orchestrator, store, _) = build(booking);

    say(&orchestrator, "покажи мои записи").await;
    let replies = say(&orchestrator, "+79001234567").await;
    assert!(replies.iter().any(|r| r.contains("2025-06-20")));
    assert!(!store.has_session("tg-100"));
}

// =============================================================================
// Cross-cutting behaviour
// =============================================================================

#[tokio::test]
async fn reset_command_abandons_flow_midway() {
    let (orchestrator, store, booking) = build(MockBookingClient::default());

    say(&orchestrator, "хочу записаться").await;
    say(&orchestrator, "чихает").await;
    assert!(store.has_session("tg-100"));

    say(&orchestrator, "/stop").await;
    assert!(!store.has_session("tg-100"));
    assert!(booking.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn confirmation_dialog_confirms_via_scene_action() {
    let (orchestrator, store, booking) = build(MockBookingClient::default());

    orchestrator
        .begin_confirmation("tg-100", 777)
        .await
        .unwrap();
    assert!(store.has_session("tg-100"));

    let replies = say(&orchestrator, "да").await;
    assert!(replies.iter().any(|r| r.contains("подтверждена")));
    assert_eq!(*booking.confirmed.lock().unwrap(), vec![777]);
    assert!(!store.has_session("tg-100"));
}

#[tokio::test]
async fn history_is_capped_and_ordered() {
    let (orchestrator, store, _) = build(MockBookingClient::default());

    for i in 0..10 {
        say(&orchestrator, &format!("сообщение {}", i)).await;
    }
    let history = store.load_history("tg-100").await.unwrap();
    assert!(history.len() <= clinic_dialog::adapters::session::HISTORY_LIMIT);
    assert!(!history.is_empty());
}

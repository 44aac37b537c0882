//! Shared in-memory port fakes for scene tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::foundation::DialogError;
use crate::domain::slots::ClinicRules;
use crate::ports::{
    Appointment, BookingClient, ClinicRulesProvider, CreateAppointment, CrmClient, Doctor,
    InterpretRequest, Interpretation, StepIntent, StepInterpreter,
};

/// Recording in-memory booking system.
#[derive(Default)]
pub struct FakeBooking {
    clients: Mutex<Vec<(CrmClient, String)>>,
    doctors: Mutex<Vec<Doctor>>,
    appointments: Mutex<Vec<Appointment>>,
    available_dates: Mutex<Vec<NaiveDate>>,
    occupied_times: Mutex<Vec<String>>,
    doctor_occupied: Mutex<Vec<NaiveDateTime>>,
    created: Mutex<Vec<CreateAppointment>>,
    rescheduled: Mutex<Vec<(u64, u32, NaiveDateTime, NaiveDateTime)>>,
    cancelled: Mutex<Vec<u64>>,
    confirmed: Mutex<Vec<u64>>,
    fail_appointments: Mutex<bool>,
}

impl FakeBooking {
    pub fn add_client(&self, id: u64, phone: &str) {
        self.clients
            .lock()
            .unwrap()
            .push((CrmClient { id, name: None }, phone.to_string()));
    }

    pub fn add_doctor(&self, id: u64, last_name: &str, first_name: &str, position: &str) {
        self.doctors.lock().unwrap().push(Doctor {
            id,
            last_name: Some(last_name.to_string()),
            first_name: Some(first_name.to_string()),
            position: Some(position.to_string()),
            ..Doctor::default()
        });
    }

    pub fn add_appointment(
        &self,
        id: u64,
        client_id: u64,
        admission_date: NaiveDateTime,
        duration_minutes: Option<u32>,
    ) {
        self.appointments.lock().unwrap().push(Appointment {
            id,
            admission_date,
            clinic_id: 1,
            client_id,
            patient_id: 1,
            doctor_id: None,
            type_id: None,
            duration_minutes,
            description: None,
            status: None,
        });
    }

    pub fn set_available_dates(&self, dates: Vec<NaiveDate>) {
        *self.available_dates.lock().unwrap() = dates;
    }

    pub fn set_occupied_times(&self, times: Vec<String>) {
        *self.occupied_times.lock().unwrap() = times;
    }

    pub fn set_doctor_occupied(&self, times: Vec<NaiveDateTime>) {
        *self.doctor_occupied.lock().unwrap() = times;
    }

    pub fn fail_appointments(&self) {
        *self.fail_appointments.lock().unwrap() = true;
    }

    pub fn created_appointments(&self) -> Vec<CreateAppointment> {
        self.created.lock().unwrap().clone()
    }

    pub fn reschedule_calls(&self) -> Vec<(u64, u32, NaiveDateTime, NaiveDateTime)> {
        self.rescheduled.lock().unwrap().clone()
    }

    pub fn cancelled_ids(&self) -> Vec<u64> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn confirmed_ids(&self) -> Vec<u64> {
        self.confirmed.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingClient for FakeBooking {
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
        _last_name: &str,
        _first_name: &str,
        _middle_name: &str,
        phone: &str,
    ) -> Result<CrmClient, DialogError> {
        let mut clients = self.clients.lock().unwrap();
        let id = 1000 + clients.len() as u64;
        let client = CrmClient { id, name: None };
        clients.push((client.clone(), phone.to_string()));
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
        Ok(self.doctors.lock().unwrap().clone())
    }

    async fn get_doctor_occupied_times(
        &self,
        _doctor_id: u64,
    ) -> Result<Vec<NaiveDateTime>, DialogError> {
        Ok(self.doctor_occupied.lock().unwrap().clone())
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
        if *self.fail_appointments.lock().unwrap() {
            return Err(DialogError::external("crm", "create failed"));
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn reschedule_appointment(
        &self,
        id: u64,
        clinic_id: u32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), DialogError> {
        if *self.fail_appointments.lock().unwrap() {
            return Err(DialogError::external("crm", "reschedule failed"));
        }
        self.rescheduled.lock().unwrap().push((id, clinic_id, start, end));
        Ok(())
    }

    async fn cancel_appointment(&self, id: u64) -> Result<(), DialogError> {
        if *self.fail_appointments.lock().unwrap() {
            return Err(DialogError::external("crm", "cancel failed"));
        }
        self.cancelled.lock().unwrap().push(id);
        Ok(())
    }

    async fn confirm_appointment(&self, id: u64) -> Result<(), DialogError> {
        if *self.fail_appointments.lock().unwrap() {
            return Err(DialogError::external("crm", "confirm failed"));
        }
        self.confirmed.lock().unwrap().push(id);
        Ok(())
    }

    async fn get_available_dates(
        &self,
        _days_ahead: u32,
        _clinic_id: u32,
    ) -> Result<Vec<NaiveDate>, DialogError> {
        Ok(self.available_dates.lock().unwrap().clone())
    }

    async fn get_occupied_time_slots(
        &self,
        _date: NaiveDate,
        _clinic_id: u32,
    ) -> Result<Vec<String>, DialogError> {
        Ok(self.occupied_times.lock().unwrap().clone())
    }
}

/// Rules provider returning a fixed document.
pub struct FakeRules {
    rules: Option<ClinicRules>,
}

impl FakeRules {
    pub fn none() -> Self {
        Self { rules: None }
    }

    pub fn with_rules(rules: ClinicRules) -> Self {
        Self { rules: Some(rules) }
    }
}

#[async_trait]
impl ClinicRulesProvider for FakeRules {
    async fn current(&self) -> Result<Option<ClinicRules>, DialogError> {
        Ok(self.rules.clone())
    }
}

/// Interpreter that classifies everything as a refusal.
pub struct RefusingInterpreter;

#[async_trait]
impl StepInterpreter for RefusingInterpreter {
    async fn interpret(&self, _request: InterpretRequest) -> Result<Interpretation, DialogError> {
        Ok(Interpretation {
            intent: StepIntent::Refuse,
            validated_value: None,
            reply_message: None,
        })
    }
}

/// Interpreter that classifies everything as off-topic.
pub struct OffTopicInterpreter;

#[async_trait]
impl StepInterpreter for OffTopicInterpreter {
    async fn interpret(&self, _request: InterpretRequest) -> Result<Interpretation, DialogError> {
        Ok(Interpretation {
            intent: StepIntent::OffTopic,
            validated_value: None,
            reply_message: None,
        })
    }
}

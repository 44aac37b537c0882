//! Booking client port.
//!
//! Wraps the external clinic booking system (CRM). The CRM owns all
//! appointment state; the core reads and writes through these operations
//! and never caches authoritative data beyond the current turn.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DialogError;

/// CRM client (pet owner) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmClient {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// CRM doctor record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: u64,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl Doctor {
    /// Display name assembled last-first-middle, falling back to full_name.
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().filter(|s| !s.trim().is_empty()) {
            return full.trim().to_string();
        }
        let parts: Vec<&str> = [&self.last_name, &self.first_name, &self.middle_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        parts.join(" ")
    }

    /// Last name used for roster matching in the rules document.
    pub fn roster_last_name(&self) -> String {
        if let Some(last) = self.last_name.as_deref().filter(|s| !s.trim().is_empty()) {
            return last.trim().to_string();
        }
        self.display_name()
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Appointment as known to the booking system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: u64,
    pub admission_date: NaiveDateTime,
    pub clinic_id: u32,
    pub client_id: u64,
    pub patient_id: u64,
    #[serde(default)]
    pub doctor_id: Option<u64>,
    #[serde(default)]
    pub type_id: Option<u32>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// All fields required to create an appointment.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAppointment {
    pub type_id: u32,
    pub admission_date: NaiveDateTime,
    pub clinic_id: u32,
    pub client_id: u64,
    pub patient_id: u64,
    pub description: String,
    pub duration_minutes: u32,
    pub doctor_id: Option<u64>,
}

/// Port wrapping the booking system's operations.
///
/// All calls are bounded by the adapter's hard timeout; failures map to
/// `DialogError::ExternalService` and are handled scene-locally.
#[async_trait]
pub trait BookingClient: Send + Sync {
    /// Find a client by canonical phone. Returns `None` when absent.
    async fn get_client_by_phone(&self, phone: &str) -> Result<Option<CrmClient>, DialogError>;

    /// Create a client, returning the new record.
    async fn create_client(
        &self,
        last_name: &str,
        first_name: &str,
        middle_name: &str,
        phone: &str,
    ) -> Result<CrmClient, DialogError>;

    /// Create a pet for a client, returning the new patient id.
    async fn create_pet(
        &self,
        client_id: u64,
        name: &str,
        type_id: u32,
        breed_id: u32,
    ) -> Result<u64, DialogError>;

    /// Doctors who take booked appointments.
    async fn get_doctors_with_appointment(&self) -> Result<Vec<Doctor>, DialogError>;

    /// Start times of a doctor's existing bookings.
    async fn get_doctor_occupied_times(
        &self,
        doctor_id: u64,
    ) -> Result<Vec<NaiveDateTime>, DialogError>;

    /// Upcoming appointments for a client, soonest first.
    async fn get_client_appointments(
        &self,
        client_id: u64,
    ) -> Result<Vec<Appointment>, DialogError>;

    /// Create an appointment.
    async fn create_appointment(&self, request: &CreateAppointment) -> Result<(), DialogError>;

    /// Move an appointment to a new start/end.
    async fn reschedule_appointment(
        &self,
        id: u64,
        clinic_id: u32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), DialogError>;

    /// Cancel an appointment. Idempotent by appointment id.
    async fn cancel_appointment(&self, id: u64) -> Result<(), DialogError>;

    /// Confirm an appointment.
    async fn confirm_appointment(&self, id: u64) -> Result<(), DialogError>;

    /// Dates with any free capacity within `days_ahead`.
    async fn get_available_dates(
        &self,
        days_ahead: u32,
        clinic_id: u32,
    ) -> Result<Vec<NaiveDate>, DialogError>;

    /// Occupied `HH:MM` times clinic-wide for one date.
    async fn get_occupied_time_slots(
        &self,
        date: NaiveDate,
        clinic_id: u32,
    ) -> Result<Vec<String>, DialogError>;
}

//! HTTP booking client for the Vetmanager-style CRM REST API.
//!
//! Authentication is a static `X-REST-Api-Key` header. Responses arrive in
//! a `{ "data": { ... } }` envelope, with numeric ids sometimes encoded as
//! strings; the DTOs below tolerate both.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration as StdDuration;
use tracing::debug;

use crate::config::CrmConfig;
use crate::domain::foundation::DialogError;
use crate::ports::{Appointment, BookingClient, CreateAppointment, CrmClient, Doctor};

const API_KEY_HEADER: &str = "X-REST-Api-Key";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration for the CRM client.
#[derive(Debug, Clone)]
pub struct HttpBookingConfig {
    api_key: Secret<String>,
    pub base_url: String,
    pub clinic_id: u32,
    pub timeout: StdDuration,
}

impl HttpBookingConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: base_url.into(),
            clinic_id: 1,
            timeout: StdDuration::from_secs(30),
        }
    }

    pub fn with_clinic_id(mut self, clinic_id: u32) -> Self {
        self.clinic_id = clinic_id;
        self
    }

    pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &CrmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            clinic_id: config.clinic_id,
            timeout: config.timeout(),
        }
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// CRM REST adapter for the `BookingClient` port.
pub struct HttpBookingClient {
    config: HttpBookingConfig,
    client: Client,
}

impl HttpBookingClient {
    pub fn new(config: HttpBookingConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, DialogError> {
        self.client
            .get(self.url(path))
            .query(query)
            .header(API_KEY_HEADER, self.config.api_key())
            .send()
            .await
            .map_err(map_transport_error)
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, DialogError> {
        self.client
            .post(self.url(path))
            .header(API_KEY_HEADER, self.config.api_key())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)
    }

    async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, DialogError> {
        self.client
            .put(self.url(path))
            .header(API_KEY_HEADER, self.config.api_key())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)
    }

    async fn check_status(response: Response) -> Result<Response, DialogError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %body, "crm request failed");
        match status {
            StatusCode::NOT_FOUND => Err(DialogError::not_found("crm resource", body)),
            _ => Err(DialogError::external(
                "crm",
                format!("status {}: {}", status, body),
            )),
        }
    }

    /// All admissions in `[from, to)`, optionally narrowed to one clinic.
    /// The API does not reliably apply filters, so they are re-applied here.
    async fn fetch_admissions(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        clinic_id: Option<u32>,
        client_id: Option<u64>,
    ) -> Result<Vec<AdmissionDto>, DialogError> {
        let mut query: Vec<(&str, String)> = vec![
            ("date_from", from.format(DATE_TIME_FORMAT).to_string()),
            ("date_to", to.format(DATE_TIME_FORMAT).to_string()),
        ];
        if let Some(clinic_id) = clinic_id {
            query.push(("clinic_id", clinic_id.to_string()));
        }
        if let Some(client_id) = client_id {
            query.push(("client_id", client_id.to_string()));
        }
        let response = Self::check_status(self.get("Admission", &query).await?).await?;
        let envelope: Envelope<AdmissionList> =
            response.json().await.map_err(map_transport_error)?;
        Ok(envelope
            .data
            .admission
            .into_iter()
            .filter(|a| {
                a.parsed_date()
                    .map(|d| d >= from && d < to)
                    .unwrap_or(false)
            })
            .filter(|a| clinic_id.map_or(true, |c| a.clinic_id == Some(c)))
            .filter(|a| client_id.map_or(true, |c| a.client_id == Some(c)))
            .collect())
    }
}

#[async_trait]
impl BookingClient for HttpBookingClient {
    async fn get_client_by_phone(&self, phone: &str) -> Result<Option<CrmClient>, DialogError> {
        let response = Self::check_status(
            self.get(
                "client/clientsSearchData",
                &[("search_query", phone.to_string())],
            )
            .await?,
        )
        .await?;
        let envelope: Envelope<ClientList> = response.json().await.map_err(map_transport_error)?;
        Ok(envelope.data.client.into_iter().next().map(|c| CrmClient {
            id: c.id,
            name: c.display_name(),
        }))
    }

    async fn create_client(
        &self,
        last_name: &str,
        first_name: &str,
        middle_name: &str,
        phone: &str,
    ) -> Result<CrmClient, DialogError> {
        let body = CreateClientDto {
            last_name,
            first_name,
            middle_name,
            cell_phone: phone,
            status: "TEMPORARY",
        };
        let response = Self::check_status(self.post_json("client", &body).await?).await?;
        let envelope: Envelope<ClientList> = response.json().await.map_err(map_transport_error)?;
        let created = envelope
            .data
            .client
            .into_iter()
            .next()
            .ok_or_else(|| DialogError::external("crm", "empty create-client response"))?;
        Ok(CrmClient {
            id: created.id,
            name: created.display_name(),
        })
    }

    async fn create_pet(
        &self,
        client_id: u64,
        name: &str,
        type_id: u32,
        breed_id: u32,
    ) -> Result<u64, DialogError> {
        let body = CreatePetDto {
            owner_id: client_id,
            alias: name,
            type_id,
            breed_id,
        };
        let response = Self::check_status(self.post_json("pet", &body).await?).await?;
        let envelope: Envelope<PetList> = response.json().await.map_err(map_transport_error)?;
        envelope
            .data
            .pet
            .into_iter()
            .next()
            .map(|p| p.id)
            .ok_or_else(|| DialogError::external("crm", "empty create-pet response"))
    }

    async fn get_doctors_with_appointment(&self) -> Result<Vec<Doctor>, DialogError> {
        let response = Self::check_status(self.get("userPosition", &[]).await?).await?;
        let envelope: Envelope<UserPositionList> =
            response.json().await.map_err(map_transport_error)?;
        Ok(envelope
            .data
            .user_position
            .into_iter()
            .map(|u| Doctor {
                id: u.id,
                last_name: u.last_name,
                first_name: u.first_name,
                middle_name: u.middle_name,
                full_name: u.full_name,
                position: u.position,
            })
            .collect())
    }

    async fn get_doctor_occupied_times(
        &self,
        doctor_id: u64,
    ) -> Result<Vec<NaiveDateTime>, DialogError> {
        let from = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
        let to = from + Duration::days(15);
        Ok(self
            .fetch_admissions(from, to, None, None)
            .await?
            .into_iter()
            .filter(|a| a.user_id == Some(doctor_id))
            .filter_map(|a| a.parsed_date())
            .collect())
    }

    async fn get_client_appointments(
        &self,
        client_id: u64,
    ) -> Result<Vec<Appointment>, DialogError> {
        let from = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
        let to = from + Duration::days(365);
        let mut appointments: Vec<Appointment> = self
            .fetch_admissions(from, to, None, Some(client_id))
            .await?
            .into_iter()
            .filter_map(|a| a.into_appointment())
            .collect();
        appointments.sort_by_key(|a| a.admission_date);
        Ok(appointments)
    }

    async fn create_appointment(&self, request: &CreateAppointment) -> Result<(), DialogError> {
        let body = CreateAdmissionDto {
            reception_write_channel: "not_confirmed",
            type_id: request.type_id,
            admission_date: request.admission_date.format(DATE_TIME_FORMAT).to_string(),
            clinic_id: request.clinic_id,
            client_id: request.client_id,
            patient_id: request.patient_id,
            description: &request.description,
            admission_length: format_admission_length(request.duration_minutes),
            user_id: request.doctor_id,
        };
        Self::check_status(self.post_json("Admission", &body).await?).await?;
        Ok(())
    }

    async fn reschedule_appointment(
        &self,
        id: u64,
        clinic_id: u32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), DialogError> {
        let body = RescheduleDto {
            clinic_id,
            start: start.format(DATE_TIME_FORMAT).to_string(),
            end: end.format(DATE_TIME_FORMAT).to_string(),
        };
        Self::check_status(self.put_json(&format!("Admission/{}", id), &body).await?).await?;
        Ok(())
    }

    async fn cancel_appointment(&self, id: u64) -> Result<(), DialogError> {
        Self::check_status(
            self.post_json("Admission/CancelAdmission", &serde_json::json!({ "id": id }))
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn confirm_appointment(&self, id: u64) -> Result<(), DialogError> {
        Self::check_status(
            self.post_json("Admission/ConfirmAdmission", &serde_json::json!({ "id": id }))
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn get_available_dates(
        &self,
        days_ahead: u32,
        _clinic_id: u32,
    ) -> Result<Vec<NaiveDate>, DialogError> {
        // The CRM exposes no calendar endpoint: working dates are generated
        // locally, Sundays excluded.
        let today = Utc::now().date_naive();
        Ok((0..days_ahead as i64)
            .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
            .filter(|date| date.weekday() != Weekday::Sun)
            .collect())
    }

    async fn get_occupied_time_slots(
        &self,
        date: NaiveDate,
        clinic_id: u32,
    ) -> Result<Vec<String>, DialogError> {
        let from = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let to = from + Duration::days(1);
        Ok(self
            .fetch_admissions(from, to, Some(clinic_id), None)
            .await?
            .into_iter()
            .filter_map(|a| a.parsed_date())
            .map(|d| d.format("%H:%M").to_string())
            .collect())
    }
}

fn map_transport_error(err: reqwest::Error) -> DialogError {
    if err.is_timeout() {
        DialogError::external("crm", "request timed out")
    } else if err.is_connect() {
        DialogError::external("crm", format!("connection failed: {}", err))
    } else {
        DialogError::external("crm", err.to_string())
    }
}

/// "HH:MM:SS" admission length used by the CRM.
fn format_admission_length(duration_minutes: u32) -> String {
    format!("{:02}:{:02}:00", duration_minutes / 60, duration_minutes % 60)
}

// --- wire DTOs ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ClientList {
    #[serde(default)]
    client: Vec<ClientDto>,
}

#[derive(Debug, Deserialize)]
struct ClientDto {
    #[serde(deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
}

impl ClientDto {
    fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.last_name, &self.first_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PetList {
    #[serde(default)]
    pet: Vec<PetDto>,
}

#[derive(Debug, Deserialize)]
struct PetDto {
    #[serde(deserialize_with = "lenient_u64")]
    id: u64,
}

#[derive(Debug, Default, Deserialize)]
struct UserPositionList {
    #[serde(default, rename = "userPosition")]
    user_position: Vec<UserPositionDto>,
}

#[derive(Debug, Deserialize)]
struct UserPositionDto {
    #[serde(deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    middle_name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AdmissionList {
    #[serde(default)]
    admission: Vec<AdmissionDto>,
}

#[derive(Debug, Deserialize)]
struct AdmissionDto {
    #[serde(deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default)]
    admission_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    clinic_id: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    client_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    patient_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    user_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    type_id: Option<u32>,
    #[serde(default)]
    admission_length: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl AdmissionDto {
    fn parsed_date(&self) -> Option<NaiveDateTime> {
        let raw = self.admission_date.as_deref()?;
        NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }

    fn duration_minutes(&self) -> Option<u32> {
        let raw = self.admission_length.as_deref()?;
        let mut parts = raw.split(':');
        let hours: u32 = parts.next()?.parse().ok()?;
        let minutes: u32 = parts.next()?.parse().ok()?;
        Some(hours * 60 + minutes)
    }

    fn into_appointment(self) -> Option<Appointment> {
        let admission_date = self.parsed_date()?;
        Some(Appointment {
            id: self.id,
            admission_date,
            clinic_id: self.clinic_id.unwrap_or(1),
            client_id: self.client_id.unwrap_or_default(),
            patient_id: self.patient_id.unwrap_or_default(),
            doctor_id: self.user_id,
            type_id: self.type_id,
            duration_minutes: self.duration_minutes(),
            description: self.description,
            status: self.status,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateClientDto<'a> {
    last_name: &'a str,
    first_name: &'a str,
    middle_name: &'a str,
    cell_phone: &'a str,
    status: &'a str,
}

#[derive(Debug, Serialize)]
struct CreatePetDto<'a> {
    owner_id: u64,
    alias: &'a str,
    type_id: u32,
    breed_id: u32,
}

#[derive(Debug, Serialize)]
struct CreateAdmissionDto<'a> {
    reception_write_channel: &'a str,
    type_id: u32,
    admission_date: String,
    clinic_id: u32,
    client_id: u64,
    patient_id: u64,
    description: &'a str,
    admission_length: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RescheduleDto {
    clinic_id: u32,
    start: String,
    end: String,
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(u64),
        String(String),
        Null,
    }
    match Option::<Lenient>::deserialize(deserializer)? {
        None | Some(Lenient::Null) => Ok(None),
        Some(Lenient::Number(n)) => Ok(Some(n)),
        Some(Lenient::String(s)) => Ok(s.parse().ok()),
    }
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_opt_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

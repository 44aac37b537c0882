//! Clinic rules document types.
//!
//! The rules document is produced outside this service (an ingestion
//! pipeline distills it from the clinic's weekly roster) and is treated as
//! read-only input: latest version wins, absence falls back to default slot
//! generation. Deserialization tolerates unknown fields so document schema
//! additions never break the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day-specific override tags a schedule entry may carry.
pub const TAG_SURGERY_DAY: &str = "surgery_day";
pub const TAG_DENTAL_DAY: &str = "dental_day";
pub const TAG_CARDIOLOGY_DAY: &str = "cardiology_day";

/// Externally supplied rostering and business-rule document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicRules {
    #[serde(default)]
    pub schedule: Vec<DaySchedule>,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub doctors: Vec<DoctorRule>,
    #[serde(default)]
    pub period: Option<RulesPeriod>,
}

/// One calendar day of rostering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub date: NaiveDate,

    /// Doctors taking booked appointments this day.
    #[serde(default)]
    pub doctor_appointments: Vec<String>,

    /// Doctors present only to run procedures; not directly bookable.
    #[serde(default)]
    pub procedure_providers: Vec<String>,

    /// Walk-in-only days accept no bookings at all.
    #[serde(default)]
    pub walk_in_only: bool,

    /// Special-day tags, see `TAG_*` constants.
    #[serde(default)]
    pub special_tags: Vec<String>,

    /// Opening time override, `HH:MM`. Defaults to 09:00.
    #[serde(default)]
    pub clinic_opens_at: Option<String>,
}

impl DaySchedule {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.special_tags.iter().any(|t| t == tag)
    }
}

/// Special-day business rules, keyed by the named specialist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessRules {
    #[serde(default)]
    pub surgery_day: Option<FixedSlotsRule>,
    #[serde(default)]
    pub dental_day: Option<FixedSlotsRule>,
    #[serde(default)]
    pub cardiology_day: Option<GeneratedSlotsRule>,
}

/// Surgery and dental days book into a fixed list of consult slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedSlotsRule {
    /// Last name of the specialist the rule applies to.
    pub specialist: String,
    #[serde(default)]
    pub slots: Vec<String>,
}

/// Cardiology days generate 60-minute slots over custom hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSlotsRule {
    pub specialist: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Per-doctor appointment durations from the rules document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRule {
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub duration: DoctorDurations,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDurations {
    #[serde(default)]
    pub primary: Option<u32>,
    #[serde(default)]
    pub repeat: Option<u32>,
    #[serde(default)]
    pub ultrasound: Option<u32>,
    #[serde(default)]
    pub analyses: Option<u32>,
    #[serde(default)]
    pub xray: Option<u32>,
}

/// Optional validity window for the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

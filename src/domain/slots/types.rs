//! Appointment types and the ephemeral slot value object.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Kind of appointment the user is booking.
///
/// Drives both the booking-system type id and the slot duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Primary,
    Secondary,
    Vaccination,
    Ultrasound,
    Analyses,
    Xray,
    Other,
}

impl AppointmentType {
    /// Booking-system type id.
    pub fn type_id(&self) -> u32 {
        match self {
            AppointmentType::Primary => 1,
            AppointmentType::Secondary => 2,
            AppointmentType::Vaccination => 3,
            AppointmentType::Ultrasound => 4,
            AppointmentType::Analyses => 5,
            AppointmentType::Xray => 6,
            AppointmentType::Other => 1,
        }
    }

    /// Default appointment length in minutes.
    pub fn duration_minutes(&self) -> u32 {
        match self {
            AppointmentType::Primary => 60,
            AppointmentType::Secondary => 30,
            AppointmentType::Vaccination => 30,
            AppointmentType::Ultrasound => 30,
            AppointmentType::Analyses => 15,
            AppointmentType::Xray => 30,
            AppointmentType::Other => 60,
        }
    }

    /// Human-readable Russian label for menus and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::Primary => "первичный приём",
            AppointmentType::Secondary => "повторный приём",
            AppointmentType::Vaccination => "вакцинация",
            AppointmentType::Ultrasound => "УЗИ",
            AppointmentType::Analyses => "анализы",
            AppointmentType::Xray => "рентген",
            AppointmentType::Other => "другое",
        }
    }

    /// Maps free text or a menu number to an appointment type.
    pub fn parse(input: &str) -> Option<Self> {
        let text = input.trim().to_lowercase();
        match text.as_str() {
            "1" => return Some(AppointmentType::Primary),
            "2" => return Some(AppointmentType::Secondary),
            "3" => return Some(AppointmentType::Vaccination),
            "4" => return Some(AppointmentType::Ultrasound),
            "5" => return Some(AppointmentType::Analyses),
            "6" => return Some(AppointmentType::Xray),
            "7" => return Some(AppointmentType::Other),
            _ => {}
        }
        if text.contains("первич") {
            Some(AppointmentType::Primary)
        } else if text.contains("повтор") || text.contains("вторич") {
            Some(AppointmentType::Secondary)
        } else if text.contains("вакцин") || text.contains("привив") {
            Some(AppointmentType::Vaccination)
        } else if text.contains("узи") {
            Some(AppointmentType::Ultrasound)
        } else if text.contains("анализ") {
            Some(AppointmentType::Analyses)
        } else if text.contains("рентген") {
            Some(AppointmentType::Xray)
        } else if text.contains("друго") || text.contains("иное") {
            Some(AppointmentType::Other)
        } else {
            None
        }
    }
}

/// A bookable `(date, time)` pair for a specific doctor.
///
/// Ephemeral: recomputed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub slot_type: AppointmentType,
}

impl AvailableSlot {
    pub fn new(date: NaiveDate, time: NaiveTime, slot_type: AppointmentType) -> Self {
        Self { date, time, slot_type }
    }
}

//! Slot availability engine and the clinic rules document it consumes.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::{
    available_slots, generate_time_slots, name_matches, resolve_duration, AvailabilityOutcome,
    OccupiedSet, SlotQuery,
};
pub use rules::{ClinicRules, DaySchedule};
pub use types::{AppointmentType, AvailableSlot};

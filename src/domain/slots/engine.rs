//! Slot availability engine.
//!
//! Pure functions: given a doctor, a date window, the clinic rules document
//! and the doctor's occupied times, compute the bookable `(date, time)`
//! pairs. Rules restrict, they never add availability beyond rostering.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::domain::foundation::similarity;

use super::rules::{ClinicRules, DaySchedule, TAG_CARDIOLOGY_DAY, TAG_DENTAL_DAY, TAG_SURGERY_DAY};
use super::types::{AppointmentType, AvailableSlot};

/// Default horizon when neither an explicit date nor a rules period is given.
const DEFAULT_HORIZON_DAYS: i64 = 14;

/// Default opening and closing times for generated slot ranges.
const DEFAULT_OPEN: &str = "09:00";
const DEFAULT_CLOSE: &str = "18:00";

/// Minimum edit-distance similarity for the fuzzy roster-name tier.
const NAME_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Cardiology-day defaults when the rule omits custom hours.
const CARDIOLOGY_DEFAULT_START: &str = "10:00";
const CARDIOLOGY_DEFAULT_END: &str = "20:00";
const CARDIOLOGY_STEP_MINUTES: u32 = 60;

/// Occupied times for one doctor, keyed by `(date, time)`.
pub type OccupiedSet = HashSet<(NaiveDate, NaiveTime)>;

/// One availability request.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    /// Doctor last name as resolved by the scene (used for roster matching).
    pub doctor_last_name: String,
    /// Restrict the computation to a single date.
    pub explicit_date: Option<NaiveDate>,
    /// Drives the per-type slot duration.
    pub appointment_type: AppointmentType,
    /// Injected so the engine stays a pure function.
    pub today: NaiveDate,
}

/// Result of an availability computation.
///
/// Empty results carry their cause so scenes can phrase the right message:
/// a doctor absent from every roster is not the same as one fully booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityOutcome {
    Available(Vec<AvailableSlot>),
    /// The doctor appears on no matching roster date.
    NotRostered,
    /// Rostered (or rules absent) but every slot is taken.
    FullyBooked { rostered_dates: Vec<NaiveDate> },
}

impl AvailabilityOutcome {
    pub fn slots(&self) -> &[AvailableSlot] {
        match self {
            AvailabilityOutcome::Available(slots) => slots,
            _ => &[],
        }
    }
}

/// Computes bookable slots for a doctor across the active date window.
pub fn available_slots(
    query: &SlotQuery,
    rules: Option<&ClinicRules>,
    occupied: &OccupiedSet,
) -> AvailabilityOutcome {
    let (start, end) = period(query, rules);
    let duration = resolve_duration(rules, &query.doctor_last_name, query.appointment_type);

    let slots = match rules {
        Some(rules) if !rules.schedule.is_empty() => {
            slots_from_schedule(query, rules, start, end, duration, occupied)
        }
        _ => slots_default(query, start, end, duration, occupied),
    };

    if !slots.is_empty() {
        return AvailabilityOutcome::Available(slots);
    }

    match rules {
        Some(rules) if !rules.schedule.is_empty() => {
            let rostered: Vec<NaiveDate> = rules
                .schedule
                .iter()
                .filter(|day| {
                    day.doctor_appointments
                        .iter()
                        .any(|name| name_matches(name, &query.doctor_last_name))
                })
                .map(|day| day.date)
                .collect();
            if rostered.is_empty() {
                AvailabilityOutcome::NotRostered
            } else {
                AvailabilityOutcome::FullyBooked { rostered_dates: rostered }
            }
        }
        _ => AvailabilityOutcome::FullyBooked { rostered_dates: Vec::new() },
    }
}

/// Generates `HH:MM` slot times from `start` (inclusive) to `end`
/// (exclusive) every `duration_minutes`. Deterministic for identical input.
pub fn generate_time_slots(start: NaiveTime, end: NaiveTime, duration_minutes: u32) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    if duration_minutes == 0 {
        return slots;
    }
    let step = Duration::minutes(i64::from(duration_minutes));
    let mut current = start;
    while current < end {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }
    slots
}

/// Roster-name match: first word equality, containment, then edit-distance
/// similarity of the last-name words, all case-insensitive. The similarity
/// tier absorbs typos like "петровв".
pub fn name_matches(rostered: &str, last_name: &str) -> bool {
    let rostered = rostered.trim().to_lowercase();
    let search = last_name.trim().to_lowercase();
    if rostered.is_empty() || search.is_empty() {
        return false;
    }
    let first_word = rostered.split_whitespace().next().unwrap_or(&rostered);
    if first_word == search || rostered.contains(&search) {
        return true;
    }
    similarity(first_word, &search) > NAME_SIMILARITY_THRESHOLD
}

/// Per-type slot duration, preferring the doctor's entry in the rules
/// document over the type default.
pub fn resolve_duration(
    rules: Option<&ClinicRules>,
    last_name: &str,
    appointment_type: AppointmentType,
) -> u32 {
    let doctor = rules.and_then(|r| {
        r.doctors.iter().find(|d| {
            name_matches(&d.last_name, last_name) || name_matches(&d.name, last_name)
        })
    });
    let durations = doctor.map(|d| &d.duration);

    match appointment_type {
        AppointmentType::Primary | AppointmentType::Vaccination | AppointmentType::Other => {
            durations
                .and_then(|d| d.primary)
                .unwrap_or_else(|| AppointmentType::Primary.duration_minutes())
        }
        AppointmentType::Secondary => durations
            .and_then(|d| d.repeat)
            .unwrap_or_else(|| AppointmentType::Secondary.duration_minutes()),
        AppointmentType::Ultrasound => durations
            .and_then(|d| d.ultrasound)
            .unwrap_or_else(|| AppointmentType::Ultrasound.duration_minutes()),
        AppointmentType::Analyses => durations
            .and_then(|d| d.analyses)
            .unwrap_or_else(|| AppointmentType::Analyses.duration_minutes()),
        AppointmentType::Xray => durations
            .and_then(|d| d.xray)
            .unwrap_or_else(|| AppointmentType::Xray.duration_minutes()),
    }
}

fn period(query: &SlotQuery, rules: Option<&ClinicRules>) -> (NaiveDate, NaiveDate) {
    if let Some(date) = query.explicit_date {
        return (date, date);
    }
    if let Some(period) = rules.and_then(|r| r.period.as_ref()) {
        return (period.start, period.end);
    }
    (query.today, query.today + Duration::days(DEFAULT_HORIZON_DAYS))
}

fn slots_from_schedule(
    query: &SlotQuery,
    rules: &ClinicRules,
    start: NaiveDate,
    end: NaiveDate,
    duration: u32,
    occupied: &OccupiedSet,
) -> Vec<AvailableSlot> {
    let mut result = Vec::new();

    for day in &rules.schedule {
        if let Some(date) = query.explicit_date {
            if day.date != date {
                continue;
            }
        }
        if day.date < query.today || day.date < start || day.date > end {
            continue;
        }

        let is_working = day
            .doctor_appointments
            .iter()
            .any(|name| name_matches(name, &query.doctor_last_name));
        let is_procedure_only = !is_working
            && day
                .procedure_providers
                .iter()
                .any(|name| name_matches(name, &query.doctor_last_name));
        if is_procedure_only || day.walk_in_only || !is_working {
            continue;
        }

        for time in day_time_slots(day, rules, &query.doctor_last_name, duration) {
            if !occupied.contains(&(day.date, time)) {
                result.push(AvailableSlot::new(day.date, time, query.appointment_type));
            }
        }
    }

    result
}

/// Special-day rules take precedence over default generation for that day.
fn day_time_slots(
    day: &DaySchedule,
    rules: &ClinicRules,
    last_name: &str,
    duration: u32,
) -> Vec<NaiveTime> {
    let br = &rules.business_rules;
    let is_specialist =
        |specialist: &str| specialist.trim().to_lowercase() == last_name.trim().to_lowercase();

    if day.has_tag(TAG_SURGERY_DAY) {
        if let Some(rule) = &br.surgery_day {
            if is_specialist(&rule.specialist) {
                return parse_fixed_slots(&rule.slots);
            }
        }
    }
    if day.has_tag(TAG_DENTAL_DAY) {
        if let Some(rule) = &br.dental_day {
            if is_specialist(&rule.specialist) {
                return parse_fixed_slots(&rule.slots);
            }
        }
    }
    if day.has_tag(TAG_CARDIOLOGY_DAY) {
        if let Some(rule) = &br.cardiology_day {
            if is_specialist(&rule.specialist) {
                let start = parse_hhmm(rule.start_time.as_deref().unwrap_or(CARDIOLOGY_DEFAULT_START));
                let end = parse_hhmm(rule.end_time.as_deref().unwrap_or(CARDIOLOGY_DEFAULT_END));
                if let (Some(start), Some(end)) = (start, end) {
                    return generate_time_slots(start, end, CARDIOLOGY_STEP_MINUTES);
                }
            }
        }
    }

    let open = day
        .clinic_opens_at
        .as_deref()
        .and_then(parse_hhmm)
        .or_else(|| parse_hhmm(DEFAULT_OPEN));
    let close = parse_hhmm(DEFAULT_CLOSE);
    match (open, close) {
        (Some(open), Some(close)) => generate_time_slots(open, close, duration),
        _ => Vec::new(),
    }
}

fn slots_default(
    query: &SlotQuery,
    start: NaiveDate,
    end: NaiveDate,
    duration: u32,
    occupied: &OccupiedSet,
) -> Vec<AvailableSlot> {
    let mut result = Vec::new();
    let (open, close) = match (parse_hhmm(DEFAULT_OPEN), parse_hhmm(DEFAULT_CLOSE)) {
        (Some(open), Some(close)) => (open, close),
        _ => return result,
    };

    let mut date = start;
    while date <= end {
        // Never offer slots on past dates.
        if date >= query.today {
            for time in generate_time_slots(open, close, duration) {
                if !occupied.contains(&(date, time)) {
                    result.push(AvailableSlot::new(date, time, query.appointment_type));
                }
            }
        }
        date += Duration::days(1);
    }
    result
}

fn parse_fixed_slots(raw: &[String]) -> Vec<NaiveTime> {
    raw.iter().filter_map(|s| parse_hhmm(s)).collect()
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slots::rules::{
        BusinessRules, DoctorDurations, DoctorRule, FixedSlotsRule, GeneratedSlotsRule,
    };
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn query(last_name: &str) -> SlotQuery {
        SlotQuery {
            doctor_last_name: last_name.to_string(),
            explicit_date: None,
            appointment_type: AppointmentType::Primary,
            today: date(2025, 6, 1),
        }
    }

    fn day(d: NaiveDate, appointments: &[&str]) -> DaySchedule {
        DaySchedule {
            date: d,
            doctor_appointments: appointments.iter().map(|s| s.to_string()).collect(),
            procedure_providers: Vec::new(),
            walk_in_only: false,
            special_tags: Vec::new(),
            clinic_opens_at: None,
        }
    }

    #[test]
    fn generate_time_slots_covers_range_exclusive_of_end() {
        let slots = generate_time_slots(time(9, 0), time(11, 0), 60);
        assert_eq!(slots, vec![time(9, 0), time(10, 0)]);
    }

    #[test]
    fn generate_time_slots_is_deterministic() {
        let a = generate_time_slots(time(9, 0), time(18, 0), 45);
        let b = generate_time_slots(time(9, 0), time(18, 0), 45);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_duration_yields_no_slots() {
        assert!(generate_time_slots(time(9, 0), time(18, 0), 0).is_empty());
    }

    #[test]
    fn no_rules_fallback_generates_fourteen_day_window() {
        let q = query("Иванова");
        let outcome = available_slots(&q, None, &OccupiedSet::new());
        let slots = outcome.slots();
        assert!(!slots.is_empty());
        // 9 one-hour slots per day across 15 calendar days.
        assert_eq!(slots.len(), 9 * 15);
        assert!(slots.iter().all(|s| s.date >= q.today));
        assert!(slots.iter().all(|s| s.date <= q.today + Duration::days(14)));
    }

    #[test]
    fn occupied_slots_are_never_offered() {
        let q = SlotQuery {
            explicit_date: Some(date(2025, 6, 2)),
            ..query("Иванова")
        };
        let mut occupied = OccupiedSet::new();
        occupied.insert((date(2025, 6, 2), time(9, 0)));
        occupied.insert((date(2025, 6, 2), time(13, 0)));

        let outcome = available_slots(&q, None, &occupied);
        for slot in outcome.slots() {
            assert!(!occupied.contains(&(slot.date, slot.time)));
        }
        assert_eq!(outcome.slots().len(), 7);
    }

    #[test]
    fn procedure_only_doctor_gets_zero_slots_for_that_day() {
        let mut schedule_day = day(date(2025, 6, 3), &["Петров"]);
        schedule_day.procedure_providers = vec!["Иванова".to_string()];
        let rules = ClinicRules {
            schedule: vec![schedule_day],
            ..ClinicRules::default()
        };

        let outcome = available_slots(&query("Иванова"), Some(&rules), &OccupiedSet::new());
        assert_eq!(outcome, AvailabilityOutcome::NotRostered);
    }

    #[test]
    fn walk_in_only_day_yields_no_slots() {
        let mut schedule_day = day(date(2025, 6, 3), &["Иванова"]);
        schedule_day.walk_in_only = true;
        let rules = ClinicRules {
            schedule: vec![schedule_day],
            ..ClinicRules::default()
        };

        let outcome = available_slots(&query("Иванова"), Some(&rules), &OccupiedSet::new());
        // Rostered for the day but walk-in only, so nothing is bookable.
        assert_eq!(
            outcome,
            AvailabilityOutcome::FullyBooked { rostered_dates: vec![date(2025, 6, 3)] }
        );
    }

    #[test]
    fn unrostered_doctor_is_reported_as_not_rostered() {
        let rules = ClinicRules {
            schedule: vec![day(date(2025, 6, 3), &["Петров"])],
            ..ClinicRules::default()
        };
        let outcome = available_slots(&query("Иванова"), Some(&rules), &OccupiedSet::new());
        assert_eq!(outcome, AvailabilityOutcome::NotRostered);
    }

    #[test]
    fn rostered_but_fully_booked_reports_dates() {
        let rules = ClinicRules {
            schedule: vec![day(date(2025, 6, 3), &["Иванова"])],
            ..ClinicRules::default()
        };
        let mut occupied = OccupiedSet::new();
        for t in generate_time_slots(time(9, 0), time(18, 0), 60) {
            occupied.insert((date(2025, 6, 3), t));
        }
        let outcome = available_slots(&query("Иванова"), Some(&rules), &occupied);
        assert_eq!(
            outcome,
            AvailabilityOutcome::FullyBooked { rostered_dates: vec![date(2025, 6, 3)] }
        );
    }

    #[test]
    fn surgery_day_uses_fixed_slots_for_named_surgeon() {
        let mut schedule_day = day(date(2025, 6, 3), &["Петров"]);
        schedule_day.special_tags = vec![TAG_SURGERY_DAY.to_string()];
        let rules = ClinicRules {
            schedule: vec![schedule_day],
            business_rules: BusinessRules {
                surgery_day: Some(FixedSlotsRule {
                    specialist: "Петров".to_string(),
                    slots: vec!["14:00".to_string(), "15:30".to_string()],
                }),
                ..BusinessRules::default()
            },
            ..ClinicRules::default()
        };

        let outcome = available_slots(&query("Петров"), Some(&rules), &OccupiedSet::new());
        let slots = outcome.slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].time, time(14, 0));
        assert_eq!(slots[1].time, time(15, 30));
    }

    #[test]
    fn surgery_day_falls_back_to_default_for_other_doctors() {
        let mut schedule_day = day(date(2025, 6, 3), &["Иванова"]);
        schedule_day.special_tags = vec![TAG_SURGERY_DAY.to_string()];
        let rules = ClinicRules {
            schedule: vec![schedule_day],
            business_rules: BusinessRules {
                surgery_day: Some(FixedSlotsRule {
                    specialist: "Петров".to_string(),
                    slots: vec!["14:00".to_string()],
                }),
                ..BusinessRules::default()
            },
            ..ClinicRules::default()
        };

        let outcome = available_slots(&query("Иванова"), Some(&rules), &OccupiedSet::new());
        // Default 09:00-18:00 hourly generation, not the surgeon's fixed list.
        assert_eq!(outcome.slots().len(), 9);
    }

    #[test]
    fn cardiology_day_generates_hourly_slots_over_rule_hours() {
        let mut schedule_day = day(date(2025, 6, 3), &["Кузнецова"]);
        schedule_day.special_tags = vec![TAG_CARDIOLOGY_DAY.to_string()];
        let rules = ClinicRules {
            schedule: vec![schedule_day],
            business_rules: BusinessRules {
                cardiology_day: Some(GeneratedSlotsRule {
                    specialist: "Кузнецова".to_string(),
                    start_time: Some("10:00".to_string()),
                    end_time: Some("14:00".to_string()),
                }),
                ..BusinessRules::default()
            },
            ..ClinicRules::default()
        };

        let outcome = available_slots(&query("Кузнецова"), Some(&rules), &OccupiedSet::new());
        let times: Vec<NaiveTime> = outcome.slots().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![time(10, 0), time(11, 0), time(12, 0), time(13, 0)]);
    }

    #[test]
    fn clinic_opening_override_shifts_generation_start() {
        let mut schedule_day = day(date(2025, 6, 3), &["Иванова"]);
        schedule_day.clinic_opens_at = Some("12:00".to_string());
        let rules = ClinicRules {
            schedule: vec![schedule_day],
            ..ClinicRules::default()
        };

        let outcome = available_slots(&query("Иванова"), Some(&rules), &OccupiedSet::new());
        assert!(outcome.slots().iter().all(|s| s.time >= time(12, 0)));
        assert_eq!(outcome.slots().len(), 6);
    }

    #[test]
    fn doctor_rule_duration_overrides_type_default() {
        let rules = ClinicRules {
            doctors: vec![DoctorRule {
                name: "Иванова Анна".to_string(),
                last_name: "Иванова".to_string(),
                duration: DoctorDurations { primary: Some(45), ..DoctorDurations::default() },
            }],
            ..ClinicRules::default()
        };
        assert_eq!(resolve_duration(Some(&rules), "Иванова", AppointmentType::Primary), 45);
        assert_eq!(resolve_duration(Some(&rules), "Петров", AppointmentType::Primary), 60);
        assert_eq!(resolve_duration(None, "Иванова", AppointmentType::Analyses), 15);
    }

    #[test]
    fn name_matches_absorbs_small_typos() {
        assert!(name_matches("Петров Сергей Иванович", "петровв"));
        assert!(!name_matches("Иванова Анна", "Кузнецов"));
    }

    #[test]
    fn past_schedule_dates_are_skipped() {
        let rules = ClinicRules {
            schedule: vec![day(date(2025, 5, 20), &["Иванова"])],
            ..ClinicRules::default()
        };
        let outcome = available_slots(&query("Иванова"), Some(&rules), &OccupiedSet::new());
        assert!(outcome.slots().is_empty());
    }

    proptest! {
        #[test]
        fn generated_slots_never_intersect_occupied(
            occupied_hours in proptest::collection::hash_set(9u32..18, 0..9)
        ) {
            let q = SlotQuery {
                explicit_date: Some(date(2025, 6, 2)),
                ..query("Иванова")
            };
            let occupied: OccupiedSet = occupied_hours
                .iter()
                .map(|h| (date(2025, 6, 2), time(*h, 0)))
                .collect();

            let outcome = available_slots(&q, None, &occupied);
            for slot in outcome.slots() {
                prop_assert!(!occupied.contains(&(slot.date, slot.time)));
            }
            prop_assert_eq!(outcome.slots().len(), 9 - occupied.len());
        }
    }
}

//! Date and time validation for appointment input.
//!
//! Parsing is regex-anchored and calendar-correct: "2025-02-30" fails at
//! proleptic date construction, not at a string heuristic. Both validators
//! take `today` explicitly so tests are deterministic.

use chrono::{Months, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::ValidationError;

/// Earliest bookable time of day.
pub const WORK_TIME_START: &str = "08:00";

/// Latest bookable time of day.
pub const WORK_TIME_END: &str = "20:00";

/// How far into the future an appointment may be booked.
pub const MAX_MONTHS_AHEAD: u32 = 12;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-.](\d{2})[-.](\d{2})$").unwrap());

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap());

/// Parses and validates an appointment date.
///
/// Accepts `YYYY-MM-DD` (or `YYYY.MM.DD`), requires a real calendar date
/// that is neither in the past nor more than [`MAX_MONTHS_AHEAD`] months
/// after `today`.
pub fn validate_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let caps = DATE_RE
        .captures(raw.trim())
        .ok_or_else(|| ValidationError::invalid_format("date", "expected YYYY-MM-DD"))?;

    let year: i32 = caps[1].parse().map_err(|_| bad_date())?;
    let month: u32 = caps[2].parse().map_err(|_| bad_date())?;
    let day: u32 = caps[3].parse().map_err(|_| bad_date())?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ValidationError::invalid_format("date", "no such calendar date"))?;

    if date < today {
        return Err(ValidationError::invalid_format("date", "date is in the past"));
    }

    let horizon = today
        .checked_add_months(Months::new(MAX_MONTHS_AHEAD))
        .ok_or_else(bad_date)?;
    if date > horizon {
        return Err(ValidationError::invalid_format(
            "date",
            "date is more than 12 months ahead",
        ));
    }

    Ok(date)
}

/// Parses and validates an appointment time.
///
/// Accepts `HH:MM` within the clinic working window
/// [`WORK_TIME_START`]..=[`WORK_TIME_END`].
pub fn validate_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    if !TIME_RE.is_match(raw) {
        return Err(ValidationError::invalid_format("time", "expected HH:MM"));
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| ValidationError::invalid_format("time", "expected HH:MM"))?;

    let start = NaiveTime::parse_from_str(WORK_TIME_START, "%H:%M").unwrap_or_default();
    let end = NaiveTime::parse_from_str(WORK_TIME_END, "%H:%M").unwrap_or_default();

    if time < start || time > end {
        return Err(ValidationError::invalid_format(
            "time",
            "outside working hours 08:00-20:00",
        ));
    }

    Ok(time)
}

fn bad_date() -> ValidationError {
    ValidationError::invalid_format("date", "expected YYYY-MM-DD")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn valid_date_parses() {
        let date = validate_date("2025-06-15", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    }

    #[test]
    fn dotted_separator_is_accepted() {
        assert!(validate_date("2025.06.15", today()).is_ok());
    }

    #[test]
    fn nonexistent_calendar_date_is_rejected() {
        assert!(validate_date("2025-02-30", today()).is_err());
    }

    #[test]
    fn past_date_is_rejected() {
        assert!(validate_date("2025-05-31", today()).is_err());
    }

    #[test]
    fn today_is_accepted() {
        assert!(validate_date("2025-06-01", today()).is_ok());
    }

    #[test]
    fn date_beyond_twelve_months_is_rejected() {
        assert!(validate_date("2026-06-02", today()).is_err());
        assert!(validate_date("2026-06-01", today()).is_ok());
    }

    #[test]
    fn garbage_date_is_rejected() {
        assert!(validate_date("завтра", today()).is_err());
        assert!(validate_date("15-06-2025", today()).is_err());
    }

    #[test]
    fn valid_time_parses() {
        assert_eq!(
            validate_time("14:30").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap()
        );
    }

    #[test]
    fn working_window_bounds_are_inclusive() {
        assert!(validate_time("08:00").is_ok());
        assert!(validate_time("20:00").is_ok());
    }

    #[test]
    fn time_outside_working_hours_is_rejected() {
        assert!(validate_time("07:59").is_err());
        assert!(validate_time("20:01").is_err());
    }

    #[test]
    fn malformed_time_is_rejected() {
        assert!(validate_time("25:00").is_err());
        assert!(validate_time("9:30").is_err());
        assert!(validate_time("14.30").is_err());
    }
}

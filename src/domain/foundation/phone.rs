//! Phone number normalization.
//!
//! Inbound phone numbers arrive in any shape the user cares to type:
//! "8 (999) 123-45-67", "+7 999 1234567", "9991234567". Normalization
//! reduces them to one canonical E.164-style string so CRM lookups are
//! keyed consistently.

use super::errors::ValidationError;

/// Minimum digits a phone number may contain.
const MIN_PHONE_DIGITS: usize = 10;

/// Maximum digits a phone number may contain.
const MAX_PHONE_DIGITS: usize = 15;

/// Normalizes a raw phone string to canonical `+<digits>` form.
///
/// Rules:
/// - all non-digit characters are stripped;
/// - 10 digits are assumed to be a local Russian number and prefixed `+7`;
/// - 11 digits starting with `8` have the `8` replaced by `+7`;
/// - anything else keeps its digits with a `+` prefix.
///
/// Digit counts outside `[10, 15]` are rejected.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
        return Err(ValidationError::out_of_range(
            "phone",
            MIN_PHONE_DIGITS as i32,
            MAX_PHONE_DIGITS as i32,
            digits.len() as i32,
        ));
    }

    let normalized = if digits.len() == 10 {
        format!("+7{}", digits)
    } else if digits.len() == 11 && digits.starts_with('8') {
        format!("+7{}", &digits[1..])
    } else {
        format!("+{}", digits)
    };

    Ok(normalized)
}

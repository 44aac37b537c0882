//! Text helpers shared by all scenes.

use chrono::{Datelike, NaiveDate};

/// Affirmative replies accepted at confirmation steps.
pub fn is_positive_response(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    matches!(
        normalized.as_str(),
        "да" | "yes" | "ок" | "окей" | "подтверждаю" | "confirm" | "подтвердить"
    )
}

/// Negative replies accepted at confirmation steps.
pub fn is_negative_response(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    matches!(
        normalized.as_str(),
        "нет" | "no" | "cancel" | "отмена" | "заново" | "отменить"
    )
}

/// Splits a free-text full name into (last, first, middle) parts.
pub fn split_name(full_name: &str) -> (String, String, String) {
    let mut parts = full_name.split_whitespace();
    let last = parts.next().unwrap_or_default().to_string();
    let first = parts.next().unwrap_or_default().to_string();
    let middle = parts.next().unwrap_or_default().to_string();
    (last, first, middle)
}

/// Parses a 1-based list index, returning the 0-based position.
pub fn parse_list_index(input: &str, len: usize) -> Option<usize> {
    let num: usize = input.trim().parse().ok()?;
    if num >= 1 && num <= len {
        Some(num - 1)
    } else {
        None
    }
}

/// Short Russian date label for lists ("Пн, 2 июн").
pub fn format_date_display(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        return "Сегодня".to_string();
    }
    if date == today.succ_opt().unwrap_or(today) {
        return "Завтра".to_string();
    }
    let day_names = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];
    let month_names = [
        "янв", "фев", "мар", "апр", "май", "июн", "июл", "авг", "сен", "окт", "ноя", "дек",
    ];
    let day_name = day_names[date.weekday().num_days_from_monday() as usize];
    let month = month_names[date.month0() as usize];
    format!("{}, {} {}", day_name, date.day(), month)
}

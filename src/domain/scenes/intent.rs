//! Deterministic quick-intent classification for messages outside a scene.

use once_cell::sync::Lazy;
use regex::Regex;

use super::session::SceneName;

static MOVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)перенес|перенос|перезапис|reschedule").unwrap());
static CANCEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)отмен|отказ|не приду|cancel").unwrap());
static SHOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)мои запис|моя запис|покаж|посмотреть запис|список запис|когда.*(прием|приём)")
        .unwrap()
});
static CREATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)запис|записат|прием|приём|appointment").unwrap());

/// Maps free text to a scene. Move/cancel/show are matched before create:
/// "перенести запись" mentions a запись too.
pub fn classify_intent(text: &str) -> Option<SceneName> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if MOVE_RE.is_match(text) {
        return Some(SceneName::MoveAppointment);
    }
    if CANCEL_RE.is_match(text) {
        return Some(SceneName::CancelAppointment);
    }
    if SHOW_RE.is_match(text) {
        return Some(SceneName::ShowAppointment);
    }
    if CREATE_RE.is_match(text) {
        return Some(SceneName::CreateAppointment);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_phrases_map_to_create() {
        assert_eq!(
            classify_intent("Хочу записаться на прием"),
            Some(SceneName::CreateAppointment)
        );
        assert_eq!(
            classify_intent("нужна запись к врачу"),
            Some(SceneName::CreateAppointment)
        );
    }

    #[test]
    fn move_wins_over_create() {
        assert_eq!(
            classify_intent("Хочу перенести запись"),
            Some(SceneName::MoveAppointment)
        );
    }

    #[test]
    fn cancel_wins_over_create() {
        assert_eq!(
            classify_intent("Хочу отменить запись на прием"),
            Some(SceneName::CancelAppointment)
        );
    }

    #[test]
    fn show_phrases_map_to_show() {
        assert_eq!(
            classify_intent("Покажите мои записи"),
            Some(SceneName::ShowAppointment)
        );
    }

    #[test]
    fn unrelated_text_yields_no_intent() {
        assert_eq!(classify_intent("Какая сегодня погода?"), None);
        assert_eq!(classify_intent("   "), None);
    }
}

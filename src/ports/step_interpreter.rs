//! Step interpreter port.
//!
//! The interpreter is a best-effort natural-language layer over the
//! deterministic step validators: it classifies a free-text reply against
//! the step's expected answer and may normalize the value. Scenes must keep
//! working when it is unreachable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DialogError;

/// What the user meant with their reply, relative to the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepIntent {
    /// The reply answers the step's question.
    Answer,
    /// The reply changes the subject.
    OffTopic,
    /// The user wants to abandon the flow.
    Refuse,
}

/// One interpretation request.
#[derive(Debug, Clone, Serialize)]
pub struct InterpretRequest {
    pub step_id: String,
    pub step_label: String,
    pub user_message: String,
    pub format_hint: Option<String>,
}

impl InterpretRequest {
    pub fn new(step_id: impl Into<String>, step_label: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            step_label: step_label.into(),
            user_message: user_message.into(),
            format_hint: None,
        }
    }

    pub fn with_format_hint(mut self, hint: impl Into<String>) -> Self {
        self.format_hint = Some(hint.into());
        self
    }
}

/// Interpreter verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpretation {
    pub intent: StepIntent,
    /// Normalized value to use instead of the raw text, when present.
    #[serde(default)]
    pub validated_value: Option<String>,
    /// Suggested reply for off-topic/refuse outcomes.
    #[serde(default)]
    pub reply_message: Option<String>,
}

impl Interpretation {
    pub fn answer(validated_value: Option<String>) -> Self {
        Self {
            intent: StepIntent::Answer,
            validated_value,
            reply_message: None,
        }
    }
}

/// Port for the natural-language step interpreter.
#[async_trait]
pub trait StepInterpreter: Send + Sync {
    /// Classify a user reply against the current step.
    ///
    /// # Errors
    ///
    /// `ExternalService` on timeout or non-success; callers fall back to
    /// deterministic validation.
    async fn interpret(&self, request: InterpretRequest) -> Result<Interpretation, DialogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_interpreter_is_object_safe() {
        fn _accepts_dyn(_interpreter: &dyn StepInterpreter) {}
    }

    #[test]
    fn interpretation_deserializes_with_optional_fields() {
        let parsed: Interpretation =
            serde_json::from_str(r#"{"intent": "answer", "validated_value": "+79991234567"}"#)
                .unwrap();
        assert_eq!(parsed.intent, StepIntent::Answer);
        assert_eq!(parsed.validated_value.as_deref(), Some("+79991234567"));
        assert!(parsed.reply_message.is_none());
    }

    #[test]
    fn request_builder_sets_format_hint() {
        let req = InterpretRequest::new("date", "Дата приёма", "завтра")
            .with_format_hint("ГГГГ-ММ-ДД");
        assert_eq!(req.format_hint.as_deref(), Some("ГГГГ-ММ-ДД"));
    }
}

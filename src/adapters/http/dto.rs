//! Request/response DTOs for the dialog HTTP API.

use serde::{Deserialize, Serialize};

/// Inbound message from a messenger bridge or test client.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub user_id: String,
    pub text: String,
}

/// Ordered bot replies for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<String>,
}

/// Trigger for an appointment-reminder confirmation dialog.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationRequest {
    pub user_id: String,
    pub appointment_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_deserializes() {
        let request: MessageRequest =
            serde_json::from_str(r#"{"user_id": "tg-42", "text": "хочу записаться"}"#).unwrap();
        assert_eq!(request.user_id, "tg-42");
        assert_eq!(request.text, "хочу записаться");
    }

    #[test]
    fn messages_response_serializes_in_order() {
        let response = MessagesResponse {
            messages: vec!["первый".to_string(), "второй".to_string()],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["messages"][0], "первый");
        assert_eq!(json["messages"][1], "второй");
    }
}

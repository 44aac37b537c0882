//! HTTP handlers for the dialog API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::error;

use crate::application::DialogOrchestrator;

use super::dto::{ConfirmationRequest, HealthResponse, MessageRequest, MessagesResponse};

/// Shared state for the dialog routes.
#[derive(Clone)]
pub struct DialogAppState {
    pub orchestrator: Arc<DialogOrchestrator>,
}

/// POST /v1/messages - process one user message and return bot replies.
pub async fn post_message(
    State(state): State<DialogAppState>,
    Json(request): Json<MessageRequest>,
) -> impl IntoResponse {
    let messages = state
        .orchestrator
        .handle_message(&request.user_id, &request.text)
        .await;
    Json(MessagesResponse { messages })
}

/// POST /v1/confirmations - start a reminder confirmation dialog.
pub async fn post_confirmation(
    State(state): State<DialogAppState>,
    Json(request): Json<ConfirmationRequest>,
) -> impl IntoResponse {
    match state
        .orchestrator
        .begin_confirmation(&request.user_id, request.appointment_id)
        .await
    {
        Ok(messages) => Json(MessagesResponse { messages }).into_response(),
        Err(err) => {
            error!(error = %err, "failed to start confirmation dialog");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /health - liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

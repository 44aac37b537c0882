//! Route definitions for the dialog API.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, DialogAppState};

pub fn dialog_router() -> Router<DialogAppState> {
    Router::new()
        .route("/v1/messages", post(handlers::post_message))
        .route("/v1/confirmations", post(handlers::post_confirmation))
        .route("/health", get(handlers::health))
}

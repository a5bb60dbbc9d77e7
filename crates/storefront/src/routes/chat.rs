//! Shopping assistant chat handler.

use std::any::Any;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::state::AppState;

/// Returned when a chat request fails unexpectedly.
pub const CHAT_FAILURE_MESSAGE: &str = "An error occurred while processing your request";

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// Answer a shopper's message with a canned assistant reply.
///
/// Responds `{"error": "Message is required"}` with 400 when the message is
/// missing or blank, including when the body is not JSON at all.
#[instrument(skip(state, body))]
pub async fn send(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let message = body
        .ok()
        .and_then(|Json(request)| request.message)
        .filter(|m| !m.trim().is_empty());

    let Some(message) = message else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Message is required" })),
        )
            .into_response();
    };

    let reply = state.assistant().reply(&message);
    tracing::debug!(chars = message.len(), "Assistant replied");
    Json(reply).into_response()
}

/// Turn a panic inside the chat handler into the generic apology.
///
/// Installed with `CatchPanicLayer::custom` on the chat route.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = detail, "Chat assistant failed");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": CHAT_FAILURE_MESSAGE })),
    )
        .into_response()
}

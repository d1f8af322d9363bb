use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::messaging::twiml;
use crate::queue::QueueError;
use crate::replies;

/// Fatal, request-level failures of the webhook.
///
/// Collaborator failures that have a user-facing fallback never become an
/// `AppError`; only what is left ends up here. The response is still a 200
/// TwiML reply so the transport does not redeliver the message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(msg) => tracing::warn!("Rejected webhook request: {msg}"),
            AppError::Queue(e) => tracing::error!("Queue error: {e}"),
        }

        twiml_reply(replies::GENERIC_ERROR)
    }
}

/// 200 `text/xml` response carrying a single message.
pub fn twiml_reply(text: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        twiml::message_response(text),
    )
        .into_response()
}

use axum::{
    extract::{rejection::FormRejection, State},
    response::Response,
    Form,
};
use tracing::info;

use crate::errors::{twiml_reply, AppError};
use crate::state::AppState;
use crate::webhook::InboundMessage;

/// POST /webhook/whatsapp
///
/// Always answers 200 with TwiML, even on failure, so the transport does not
/// redeliver the message.
pub async fn handle_whatsapp_webhook(
    State(state): State<AppState>,
    form: Result<Form<InboundMessage>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(inbound) =
        form.map_err(|e| AppError::Validation(format!("undecodable webhook body: {e}")))?;

    info!(
        "Message from {}: {:?} (media: {})",
        inbound.from,
        inbound.body,
        if inbound.media_url.is_empty() { "none" } else { inbound.media_type.as_str() }
    );

    let reply = state.dispatcher.handle(&inbound).await?;
    Ok(twiml_reply(&reply))
}

//! Chat history bookkeeping and the free-form chat responder.

use chrono::Utc;
use tracing::{info, warn};

use crate::models::chat::Role;
use crate::store::ChatStore;

pub mod responder;

pub use responder::Responder;

/// Best-effort: a failed write is logged and otherwise ignored.
pub async fn record_user(store: &dyn ChatStore, phone_number: &str) {
    match store.upsert_user(phone_number, Utc::now().timestamp()).await {
        Ok(user) if user.created_at == user.last_interaction => {
            info!("New user {phone_number}");
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to record user {phone_number}: {e}"),
    }
}

/// Best-effort append to the sender's history, stamped with the current time.
pub async fn record_chat(store: &dyn ChatStore, phone_number: &str, role: Role, message: &str) {
    let timestamp_ms = Utc::now().timestamp_millis();
    if let Err(e) = store
        .append_chat(phone_number, timestamp_ms, role, message)
        .await
    {
        warn!(
            "Failed to record {} message for {phone_number}: {e}",
            role.as_str()
        );
    }
}

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and which units this process runs.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "whatsapp-bot",
        "units": {
            "webhook": state.config.run_webhook,
            "workers": state.config.run_workers,
            "reminder_poller": state.config.run_reminder_poller,
        }
    }))
}

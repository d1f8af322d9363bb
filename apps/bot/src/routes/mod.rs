pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::webhook::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/webhook/whatsapp", post(handlers::handle_whatsapp_webhook))
        .with_state(state)
}

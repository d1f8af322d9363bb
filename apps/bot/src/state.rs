use std::sync::Arc;

use crate::config::Config;
use crate::webhook::Dispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup around the long-lived store, queue and model clients.
    pub dispatcher: Arc<Dispatcher>,
    pub config: Config,
}

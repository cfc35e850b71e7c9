//! Application setup and server configuration.

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::kernel::{RunLock, ServerDeps};
use crate::server::routes::{complex_load_handler, health_handler, root_handler, status_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    /// Shared with the scheduler so manual and scheduled runs never overlap.
    pub run_lock: RunLock,
}

impl AppState {
    pub fn new(deps: Arc<ServerDeps>, run_lock: RunLock) -> Self {
        Self { deps, run_lock }
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/status", get(status_handler))
        .route("/complex_load", get(complex_load_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

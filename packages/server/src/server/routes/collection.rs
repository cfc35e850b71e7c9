use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::domains::collection::{start_background_run, CollectionError};
use crate::server::app::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `idle` or `working`
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn root_handler() -> &'static str {
    "Naver real estate listing collector is running."
}

/// Whether a collection run is currently in flight.
pub async fn status_handler(Extension(state): Extension<AppState>) -> Json<StatusResponse> {
    let status = if state.run_lock.is_active() {
        "working"
    } else {
        "idle"
    };
    Json(StatusResponse { status })
}

/// Start a collection run in the background.
///
/// Returns 202 once the run is started, 409 when one is already active. The
/// request never waits for the run itself.
pub async fn complex_load_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<MessageResponse>) {
    match start_background_run(state.deps.clone(), &state.run_lock) {
        Ok(_) => {
            tracing::info!("Data collection triggered over HTTP");
            (
                StatusCode::ACCEPTED,
                Json(MessageResponse {
                    message: "Data collection has been initiated.".to_string(),
                }),
            )
        }
        Err(CollectionError::RunInProgress) => {
            tracing::warn!("Data collection already in progress, rejecting trigger");
            (
                StatusCode::CONFLICT,
                Json(MessageResponse {
                    message: "A data collection task is already in progress.".to_string(),
                }),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse {
                message: e.to_string(),
            }),
        ),
    }
}

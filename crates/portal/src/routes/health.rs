//! Health check handlers.

use axum::{extract::State, http::StatusCode};
use field_orders_core::ReferenceSlot;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the image directory exists and every reference file that is
/// present can be read. Missing reference files are not a failure: the
/// portal runs on defaults until an administrator uploads them.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let config = state.config().clone();
    let ready = tokio::task::spawn_blocking(move || {
        config.image_dir.is_dir()
            && ReferenceSlot::ALL.iter().all(|&slot| {
                let path = config.files.path(slot);
                !path.exists() || std::fs::File::open(path).is_ok()
            })
    })
    .await
    .unwrap_or(false);

    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

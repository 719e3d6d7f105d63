//! Saved photo previews.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use field_orders_core::PhotoKind;

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Serve a photo from the local image directory to a logged-in user.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let not_found = || AppError::NotFound(format!("photo {filename}"));

    let kind = PhotoKind::from_filename(&filename).ok_or_else(not_found)?;
    let path = state
        .persister()
        .photos()
        .resolve(&filename)
        .ok_or_else(not_found)?;
    let bytes = tokio::fs::read(&path).await.map_err(|_| not_found())?;

    Ok(([(header::CONTENT_TYPE, kind.mime_type())], bytes))
}

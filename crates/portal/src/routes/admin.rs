//! Admin route handlers.
//!
//! The administrator replaces the four reference spreadsheets here. Each
//! upload overwrites the local file and the reference data is reloaded
//! straight away, so the next order form already offers the new lists.

use std::str::FromStr;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use field_orders_core::{MappingEntry, ReferenceSlot};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::services::{IngestError, ReferenceData, Table, ingest};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

// =============================================================================
// View Types
// =============================================================================

/// One upload slot on the admin panel.
#[derive(Debug, Clone)]
pub struct SlotView {
    pub slug: &'static str,
    pub label: &'static str,
    pub columns: String,
    pub path: String,
}

/// A loaded user, without the password.
#[derive(Debug, Clone)]
pub struct UserView {
    pub username: String,
    pub role: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin panel template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub username: String,
    pub slots: Vec<SlotView>,
    pub distributors: Vec<String>,
    pub products: Vec<String>,
    pub users: Vec<UserView>,
    pub mapping: Vec<MappingEntry>,
    pub warnings: Vec<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub preview: Option<Table>,
}

impl AdminTemplate {
    fn new(state: &AppState, username: String, data: &ReferenceData) -> Self {
        let files = state.reference().files();
        Self {
            username,
            slots: ReferenceSlot::ALL
                .iter()
                .map(|&slot| SlotView {
                    slug: slot.slug(),
                    label: slot.label(),
                    columns: slot.required_columns().join(", "),
                    path: files.path(slot).display().to_string(),
                })
                .collect(),
            distributors: data.distributors.iter().map(str::to_owned).collect(),
            products: data.products.iter().map(str::to_owned).collect(),
            users: data
                .credentials
                .users()
                .into_iter()
                .map(|c| UserView {
                    username: c.username().to_owned(),
                    role: c.role().to_string(),
                })
                .collect(),
            mapping: data.mapping.entries().to_vec(),
            warnings: data.warnings.clone(),
            message: None,
            error: None,
            preview: None,
        }
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the admin panel.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> impl IntoResponse {
    let data = state.reference().snapshot();
    AdminTemplate::new(&state, user.username, &data)
}

/// Replace one reference file with an uploaded CSV or XLSX file.
#[instrument(skip(state, user, slot, multipart), fields(slot = %slot))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(slot): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let slot = ReferenceSlot::from_str(&slot).map_err(|e| AppError::NotFound(e.to_string()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((filename, bytes));
    }

    let Some((filename, bytes)) = upload.filter(|(name, _)| !name.is_empty()) else {
        let data = state.reference().snapshot();
        let mut page = AdminTemplate::new(&state, user.username, &data);
        page.error = Some(format!("Choose a {} file to upload.", slot.label()));
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    };

    let files = state.reference().files().clone();
    let result = tokio::task::spawn_blocking(move || ingest(&files, slot, &filename, &bytes))
        .await
        .map_err(|e| AppError::Internal(format!("upload task failed: {e}")))?;

    match result {
        Ok(report) => {
            let data = state.reload_reference().await;
            tracing::info!(rows = report.rows, "reference upload applied");
            let mut page = AdminTemplate::new(&state, user.username, &data);
            page.message = Some(format!("{} ({} rows)", report.message(), report.rows));
            page.preview = report.preview;
            Ok(page.into_response())
        }
        Err(e) => Ok(rejected(&state, user.username, &e)),
    }
}

/// Re-read every reference file from disk.
pub async fn reload(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> impl IntoResponse {
    let data: Arc<ReferenceData> = state.reload_reference().await;
    let mut page = AdminTemplate::new(&state, user.username, &data);
    page.message = Some("Reference data reloaded.".to_string());
    page
}

fn rejected(state: &AppState, username: String, error: &IngestError) -> Response {
    tracing::warn!(error = %error, "reference upload rejected");
    let data = state.reference().snapshot();
    let mut page = AdminTemplate::new(state, username, &data);
    page.error = Some(error.to_string());
    (StatusCode::BAD_REQUEST, page).into_response()
}

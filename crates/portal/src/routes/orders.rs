//! Order form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use field_orders_core::{OrderDraft, ProductLine};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireEmployee, RequireUser};
use crate::models::CurrentUser;
use crate::services::orders::{self, SelectOption, fields};
use crate::services::{FormOptions, FormStage, PersistOutcome, SubmittedForm};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Order form page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/form.html")]
pub struct OrderFormTemplate {
    pub username: String,
    pub draft: OrderDraft,
    pub employee_options: Vec<SelectOption>,
    pub distributor_options: Vec<SelectOption>,
    pub error: Option<String>,
}

/// Confirmation page template, followed by a fresh form.
#[derive(Template, WebTemplate)]
#[template(path = "orders/submitted.html")]
pub struct SubmittedTemplate {
    pub username: String,
    pub shop_name: String,
    pub ordered: Vec<ProductLine>,
    pub photo_filename: String,
    pub remote_url: String,
    pub upload_error: Option<String>,
    pub rows_appended: usize,
    pub draft: OrderDraft,
    pub employee_options: Vec<SelectOption>,
    pub distributor_options: Vec<SelectOption>,
    pub error: Option<String>,
}

/// Page for logged-in users whose role has no view.
#[derive(Template, WebTemplate)]
#[template(path = "orders/no_access.html")]
pub struct NoAccessTemplate {
    pub username: String,
    pub role: String,
}

impl OrderFormTemplate {
    fn new(user: &CurrentUser, options: &FormOptions, draft: OrderDraft) -> Self {
        Self {
            username: user.username.clone(),
            employee_options: options.employee_options(&draft.employee_name),
            distributor_options: options.distributor_options(&draft.distributor),
            draft,
            error: None,
        }
    }

    fn rejected(mut self, status: StatusCode, message: String) -> Response {
        self.error = Some(message);
        (status, self).into_response()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// =============================================================================
// Routes
// =============================================================================

/// Display the order form for employees.
///
/// Administrators are sent to their panel; other roles see an
/// informational page without a form.
pub async fn new_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Response {
    match user.stage() {
        FormStage::AuthenticatedAdmin => Redirect::to("/admin").into_response(),
        FormStage::NoAccess => NoAccessTemplate {
            role: user.role.to_string(),
            username: user.username,
        }
        .into_response(),
        _ => {
            let data = state.reference().snapshot();
            let options = FormOptions::for_user(&data, &user.username);
            let draft = options.fresh_draft(today());
            OrderFormTemplate::new(&user, &options, draft).into_response()
        }
    }
}

/// Handle an order submission.
///
/// Validation failures re-render the form with the input kept. On success
/// the photo is stored, uploaded and the ledger rows appended, then the
/// confirmation is shown above a fresh form.
#[instrument(skip(state, user, multipart), fields(username = %user.username))]
pub async fn submit(
    State(state): State<AppState>,
    RequireEmployee(user): RequireEmployee,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart).await?;

    let data = state.reference().snapshot();
    let options = FormOptions::for_user(&data, &user.username);
    let parsed = form.parse(&data.products, today());
    let page = OrderFormTemplate::new(&user, &options, parsed.draft.clone());

    let submission = match orders::validate(parsed, &options) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::info!(error = %e, "order form rejected");
            return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
        }
    };

    let outcome: PersistOutcome = match state
        .persister()
        .persist(&submission, Local::now().naive_local())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            return Ok(page.rejected(err.status(), err.user_message()));
        }
    };

    let fresh = options.fresh_draft(today());
    Ok(SubmittedTemplate {
        username: user.username.clone(),
        shop_name: submission.draft().shop_name.clone(),
        ordered: orders::ordered_summary(&submission),
        photo_filename: outcome.filename,
        remote_url: outcome.remote_url,
        upload_error: outcome.upload_error,
        rows_appended: outcome.rows_appended,
        employee_options: options.employee_options(&fresh.employee_name),
        distributor_options: options.distributor_options(&fresh.distributor),
        draft: fresh,
        error: None,
    }
    .into_response())
}

/// Collect the multipart fields into a [`SubmittedForm`].
async fn read_form(mut multipart: Multipart) -> Result<SubmittedForm, AppError> {
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == fields::PHOTO {
            let filename = field.file_name().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.set_photo(filename, bytes.to_vec());
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.insert(name, value);
        }
    }

    Ok(form)
}

//! Authentication route handlers.
//!
//! Username and password login against the credential store, and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: SecretString,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login page, or skip it when already logged in.
pub async fn login_page(OptionalUser(user): OptionalUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.stage().landing_path()).into_response();
    }
    LoginTemplate {
        error: None,
        username: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username;
    let credentials = state.reference().snapshot();

    match credentials
        .credentials
        .authenticate(&username, form.password.expose_secret())
    {
        Ok(role) => {
            let user = CurrentUser { username, role };
            set_current_user(&session, &user).await?;
            tracing::info!(role = %user.role, "login succeeded");
            Ok(Redirect::to(user.stage().landing_path()).into_response())
        }
        Err(e) => {
            tracing::warn!("login failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    error: Some(e.to_string()),
                    username,
                },
            )
                .into_response())
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/auth/login"))
}

//! Unified error handling for the portal.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::PersistError;

/// Application-level error type for the portal.
///
/// Rejected logins, uploads and order forms are not errors here: their
/// handlers render the form again with the message and a 4xx status.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order could not be stored or recorded.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Persist(PersistError::Ledger(_)) => StatusCode::BAD_GATEWAY,
            Self::Persist(PersistError::Io { .. }) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Persist(PersistError::Ledger(_)) => {
                "The order could not be recorded in the sheet. Please try again.".to_string()
            }
            Self::Persist(PersistError::Io { .. }) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Persist(_) | Self::Session(_) | Self::Internal(_)
        )
    }

    /// Capture server errors with Sentry and log them.
    ///
    /// Handlers that render their own error page call this directly; the
    /// `IntoResponse` impl calls it for everything else.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Portal request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        // Don't expose internal error details to clients
        (self.status(), self.user_message()).into_response()
    }
}

/// Set the Sentry user context from the logged-in user.
pub fn set_sentry_user(username: &str, role: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_owned()),
            other: std::iter::once(("role".to_owned(), role.into())).collect(),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

//! Google Sheets and Drive clients.
//!
//! Both services authenticate as a service account: a short-lived RS256 JWT
//! signed with the account's private key is exchanged for a bearer token,
//! which is cached until shortly before it expires.
//!
//! # Architecture
//!
//! - [`GoogleAuth`] - service account key loading and token cache
//! - [`SheetsLedger`] - ledger rows appended with `values:append`
//! - [`DriveStore`] - photos uploaded with a multipart `files.create`

pub mod auth;
pub mod drive;
pub mod sheets;

pub use auth::{GoogleAuth, GoogleAuthError};
pub use drive::DriveStore;
pub use sheets::SheetsLedger;

use std::sync::Arc;
use std::time::Duration;

use crate::config::GoogleConfig;

/// OAuth scopes requested for the service account.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// Build the Sheets ledger and Drive store sharing one HTTP client and token
/// cache.
///
/// # Errors
///
/// Returns the `reqwest` error if the HTTP client cannot be built.
pub fn clients(config: &GoogleConfig) -> Result<(SheetsLedger, DriveStore), reqwest::Error> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let auth = Arc::new(GoogleAuth::new(
        http.clone(),
        config.service_account_file.clone(),
    ));

    Ok((
        SheetsLedger::new(http.clone(), Arc::clone(&auth), config),
        DriveStore::new(http, auth, config),
    ))
}

/// Read an error response body for diagnostics.
async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

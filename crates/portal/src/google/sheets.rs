//! Ledger backed by a Google spreadsheet.

use std::sync::Arc;

use async_trait::async_trait;
use field_orders_core::{LedgerRow, LedgerValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;
use url::Url;

use super::GoogleAuth;
use crate::config::GoogleConfig;
use crate::services::persist::{LedgerBackend, LedgerError};

/// Request body of `spreadsheets.values.append`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    major_dimension: &'static str,
    values: Vec<[LedgerValue; 15]>,
}

/// Appends ledger rows to one range of one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsLedger {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    api_base: String,
    sheet_id: String,
    range: String,
}

impl SheetsLedger {
    /// Create a ledger client.
    #[must_use]
    pub fn new(http: reqwest::Client, auth: Arc<GoogleAuth>, config: &GoogleConfig) -> Self {
        Self {
            http,
            auth,
            api_base: config.sheets_api.clone(),
            sheet_id: config.sheet_id.clone(),
            range: config.sheet_range.clone(),
        }
    }

    /// The `values:append` URL for this spreadsheet and range.
    fn append_url(&self) -> Result<Url, LedgerError> {
        append_url(&self.api_base, &self.sheet_id, &self.range)
    }
}

fn append_url(api_base: &str, sheet_id: &str, range: &str) -> Result<Url, LedgerError> {
    let mut url =
        Url::parse(api_base).map_err(|e| LedgerError::Other(format!("invalid Sheets API URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| LedgerError::Other("Sheets API URL cannot be a base".into()))?
        .pop_if_empty()
        .extend([
            "v4",
            "spreadsheets",
            sheet_id,
            "values",
            &format!("{range}:append"),
        ]);
    url.query_pairs_mut()
        .append_pair("valueInputOption", "USER_ENTERED")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

#[async_trait]
impl LedgerBackend for SheetsLedger {
    #[instrument(skip(self, rows), fields(sheet_id = %self.sheet_id, rows = rows.len()))]
    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        if rows.is_empty() {
            return Ok(());
        }

        let token = self.auth.access_token().await?;
        let body = ValueRange {
            major_dimension: "ROWS",
            values: rows.iter().map(LedgerRow::values).collect(),
        };

        let response = self
            .http
            .post(self.append_url()?)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body: super::error_body(response).await,
            });
        }

        Ok(())
    }
}

//! Photo uploads to a Google Drive folder.

use std::sync::Arc;

use async_trait::async_trait;
use field_orders_core::PhotoKind;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::GoogleAuth;
use crate::config::GoogleConfig;
use crate::services::persist::{FileStore, FileStoreError};

/// File metadata part of a multipart upload.
#[derive(Debug, Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parents: Vec<&'a str>,
}

/// The fields requested back from `files.create`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    #[allow(dead_code)]
    id: Option<String>,
    web_view_link: Option<String>,
}

/// Uploads files into one Drive folder.
#[derive(Debug, Clone)]
pub struct DriveStore {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    upload_base: String,
    folder_id: String,
}

impl DriveStore {
    /// Create a Drive client.
    #[must_use]
    pub fn new(http: reqwest::Client, auth: Arc<GoogleAuth>, config: &GoogleConfig) -> Self {
        Self {
            http,
            auth,
            upload_base: config.drive_upload_api.clone(),
            folder_id: config.drive_folder_id.clone(),
        }
    }
}

fn upload_url(upload_base: &str) -> Result<Url, FileStoreError> {
    let mut url = Url::parse(upload_base)
        .map_err(|e| FileStoreError::Other(format!("invalid Drive upload URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| FileStoreError::Other("Drive upload URL cannot be a base".into()))?
        .pop_if_empty()
        .extend(["drive", "v3", "files"]);
    url.query_pairs_mut()
        .append_pair("uploadType", "multipart")
        .append_pair("fields", "id,webViewLink");
    Ok(url)
}

/// Build a `multipart/related` body: JSON metadata first, then the file.
fn multipart_body(
    boundary: &str,
    metadata: &FileMetadata<'_>,
    kind: PhotoKind,
    bytes: &[u8],
) -> Result<Vec<u8>, FileStoreError> {
    let metadata = serde_json::to_string(metadata)
        .map_err(|e| FileStoreError::Other(format!("invalid file metadata: {e}")))?;

    let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: {}\r\n\r\n", kind.mime_type()).as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Ok(body)
}

#[async_trait]
impl FileStore for DriveStore {
    #[instrument(skip(self, bytes), fields(folder_id = %self.folder_id, size = bytes.len()))]
    async fn upload(
        &self,
        filename: &str,
        kind: PhotoKind,
        bytes: &[u8],
    ) -> Result<String, FileStoreError> {
        let token = self.auth.access_token().await?;

        let boundary = format!("fo-{}", uuid::Uuid::new_v4().simple());
        let metadata = FileMetadata {
            name: filename,
            parents: if self.folder_id.is_empty() {
                Vec::new()
            } else {
                vec![self.folder_id.as_str()]
            },
        };
        let body = multipart_body(&boundary, &metadata, kind, bytes)?;

        let response = self
            .http
            .post(upload_url(&self.upload_base)?)
            .bearer_auth(token.expose_secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FileStoreError::Rejected {
                status: status.as_u16(),
                body: super::error_body(response).await,
            });
        }

        let created: CreatedFile = response.json().await?;
        let link = created.web_view_link.unwrap_or_default();
        tracing::info!(link = %link, "photo uploaded to Drive");
        Ok(link)
    }
}

//! Persisting a validated order: local photo, remote photo, ledger rows.
//!
//! The three steps run in order with no rollback between them. A failed
//! remote upload is reported and the rows are still appended with an empty
//! remote URL; a failed ledger append fails the whole submission.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use field_orders_core::{LedgerRow, OrderSubmission, PhotoKind, photo_filename, timestamp_label};
use thiserror::Error;
use tracing::instrument;

use crate::google::GoogleAuthError;

/// Upper bound on same-second filename collisions before giving up.
const MAX_FILENAME_ATTEMPTS: u32 = 1000;

// =============================================================================
// Errors
// =============================================================================

/// Errors from a remote file store.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// Could not obtain credentials.
    #[error("authentication failed: {0}")]
    Auth(#[from] GoogleAuthError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("upload rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Any other failure (used by non-HTTP stores).
    #[error("{0}")]
    Other(String),
}

/// Errors from the ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Could not obtain credentials.
    #[error("authentication failed: {0}")]
    Auth(#[from] GoogleAuthError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("append rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Any other failure (used by non-HTTP backends).
    #[error("{0}")]
    Other(String),
}

/// Errors that fail a submission.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The local photo could not be written.
    #[error("could not save photo to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger append failed (the photo has already been stored).
    #[error("could not record order: {0}")]
    Ledger(#[from] LedgerError),
}

// =============================================================================
// Collaborator traits
// =============================================================================

/// Append-only row store.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Append `rows` after the last existing row, in order.
    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), LedgerError>;
}

/// Named binary upload into a fixed remote folder.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Upload `bytes` as `filename` and return a link to view it.
    async fn upload(
        &self,
        filename: &str,
        kind: PhotoKind,
        bytes: &[u8],
    ) -> Result<String, FileStoreError>;
}

// =============================================================================
// Local photo directory
// =============================================================================

/// Directory photos are saved to.
#[derive(Debug, Clone)]
pub struct PhotoDirectory {
    root: PathBuf,
}

impl PhotoDirectory {
    /// Use `root`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created.
    pub fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a name derived from `shop_name` and `timestamp`.
    ///
    /// Never overwrites: when `<shop>_<ts>.jpg` exists, `_2`, `_3`, ... are
    /// tried in turn. Returns the chosen filename and full path. A file that
    /// was created but could not be fully written is removed again.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Io` naming the file that could not be created
    /// or written, or the directory if no free name is found.
    pub fn save(
        &self,
        shop_name: &str,
        timestamp: &str,
        bytes: &[u8],
    ) -> Result<(String, PathBuf), PersistError> {
        for attempt in 1..=MAX_FILENAME_ATTEMPTS {
            let filename = photo_filename(shop_name, timestamp, attempt);
            let path = self.root.join(&filename);
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    return match file.write_all(bytes).and_then(|()| file.sync_all()) {
                        Ok(()) => Ok((filename, path)),
                        Err(source) => Err(discard_partial(path, source)),
                    };
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(source) => return Err(PersistError::Io { path, source }),
            }
        }
        Err(PersistError::Io {
            path: self.root.clone(),
            source: std::io::Error::new(
                ErrorKind::AlreadyExists,
                "too many photos with the same name in one second",
            ),
        })
    }

    /// Resolve a stored filename, rejecting anything that is not a plain
    /// name inside the directory.
    #[must_use]
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let plain = !filename.is_empty()
            && filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !filename.starts_with('.');
        plain.then(|| self.root.join(filename))
    }
}

/// Remove a photo file left incomplete by a failed write.
fn discard_partial(path: PathBuf, source: std::io::Error) -> PersistError {
    if let Err(e) = std::fs::remove_file(&path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial photo");
    }
    PersistError::Io { path, source }
}

// =============================================================================
// Persister
// =============================================================================

/// What happened to a persisted submission.
#[derive(Debug, Clone)]
pub struct PersistOutcome {
    /// Timestamp label shared by the photo and every row.
    pub timestamp: String,
    /// Stored photo filename.
    pub filename: String,
    /// Local photo path as recorded in the ledger.
    pub local_path: String,
    /// Remote link, empty when the upload failed.
    pub remote_url: String,
    /// Upload failure shown to the user, if any.
    pub upload_error: Option<String>,
    /// Number of ledger rows appended.
    pub rows_appended: usize,
}

/// Runs the local write, remote upload and ledger append for a submission.
#[derive(Clone)]
pub struct Persister {
    photos: PhotoDirectory,
    files: Arc<dyn FileStore>,
    ledger: Arc<dyn LedgerBackend>,
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("photos", &self.photos)
            .finish_non_exhaustive()
    }
}

impl Persister {
    /// Create a persister over the given collaborators.
    #[must_use]
    pub fn new(
        photos: PhotoDirectory,
        files: Arc<dyn FileStore>,
        ledger: Arc<dyn LedgerBackend>,
    ) -> Self {
        Self {
            photos,
            files,
            ledger,
        }
    }

    /// The local photo directory.
    #[must_use]
    pub const fn photos(&self) -> &PhotoDirectory {
        &self.photos
    }

    /// Persist a submission made at `now`.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Io` if the photo cannot be saved locally (no
    /// upload or append is attempted) and `PersistError::Ledger` if the rows
    /// cannot be appended.
    #[instrument(
        skip(self, submission),
        fields(shop = %submission.draft().shop_name, rows = tracing::field::Empty)
    )]
    pub async fn persist(
        &self,
        submission: &OrderSubmission,
        now: NaiveDateTime,
    ) -> Result<PersistOutcome, PersistError> {
        let timestamp = timestamp_label(now);
        let photo = submission.photo();

        let photos = self.photos.clone();
        let shop = submission.draft().shop_name.clone();
        let ts = timestamp.clone();
        let bytes = photo.bytes.clone();
        let (filename, path) = tokio::task::spawn_blocking(move || photos.save(&shop, &ts, &bytes))
            .await
            .map_err(|e| PersistError::Io {
                path: self.photos.root().to_path_buf(),
                source: std::io::Error::other(e.to_string()),
            })??;
        let local_path = path.display().to_string();
        tracing::info!(path = %local_path, "photo saved");

        let (remote_url, upload_error) =
            match self.files.upload(&filename, photo.kind, &photo.bytes).await {
                Ok(url) => (url, None),
                Err(e) => {
                    tracing::warn!(error = %e, filename = %filename, "photo upload failed, continuing");
                    (String::new(), Some(format!("Error uploading to Drive: {e}")))
                }
            };

        let rows = submission.ledger_rows(&timestamp, &local_path, &remote_url);
        self.ledger.append_rows(&rows).await?;
        tracing::Span::current().record("rows", rows.len());
        tracing::info!(rows = rows.len(), "order recorded");

        Ok(PersistOutcome {
            timestamp,
            filename,
            local_path,
            remote_url,
            upload_error,
            rows_appended: rows.len(),
        })
    }
}

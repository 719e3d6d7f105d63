//! Reference file import.
//!
//! # Usage
//!
//! ```bash
//! fo-cli import users ./users.xlsx
//! ```
//!
//! The file goes through the same checks as an admin panel upload: the
//! extension picks the parser and the slot's required columns must be
//! present. On any error the existing reference file is left untouched.

use std::io::Write;
use std::path::{Path, PathBuf};

use field_orders_core::ReferenceSlot;
use field_orders_portal::config::ConfigError;
use field_orders_portal::services::{IngestError, ingest};
use thiserror::Error;

/// Errors that can occur during an import.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Portal configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source spreadsheet could not be read.
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spreadsheet was rejected.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Writing the confirmation failed.
    #[error("Output error: {0}")]
    Output(#[source] std::io::Error),
}

/// Import `file` into `slot`'s reference file.
///
/// # Errors
///
/// Returns `ImportError` if the file cannot be read or is rejected.
pub async fn run(slot: ReferenceSlot, file: &Path) -> Result<(), ImportError> {
    let files = super::reference_files()?;

    let bytes = tokio::fs::read(file).await.map_err(|source| ImportError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::info!(slot = %slot, file = %file.display(), "importing reference file");
    let report = ingest(&files, slot, &filename, &bytes)?;

    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "{} {} rows written to {}",
        report.message(),
        report.rows,
        report.path.display()
    )
    .map_err(ImportError::Output)?;
    Ok(())
}

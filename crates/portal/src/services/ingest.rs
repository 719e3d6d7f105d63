//! Administrator uploads of reference spreadsheets.
//!
//! An upload is parsed, checked for the slot's required columns and written
//! over the slot's local CSV file. Nothing is merged: the uploaded table
//! replaces the old one, extra columns included.

use std::path::{Path, PathBuf};

use field_orders_core::ReferenceSlot;
use thiserror::Error;
use tracing::instrument;

use super::table::{Table, TableError};
use crate::config::ReferenceFiles;

/// Errors rejecting an upload.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File name does not end in `.csv` or `.xlsx`.
    #[error("Unsupported file type '{filename}'. Upload a .csv or .xlsx file.")]
    UnsupportedFormat { filename: String },

    /// Uploaded table lacks a column the slot needs.
    #[error("{} file must have a '{column}' column", .slot.label())]
    MissingColumn {
        slot: ReferenceSlot,
        column: &'static str,
    },

    /// Uploaded file could not be parsed.
    #[error("Could not read the uploaded file: {0}")]
    Parse(#[source] TableError),

    /// Local reference file could not be written.
    #[error("Could not save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
}

impl UploadFormat {
    /// Pick the format from the uploaded file name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `IngestError::UnsupportedFormat` for any other extension.
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Ok(Self::Xlsx)
        } else {
            Err(IngestError::UnsupportedFormat {
                filename: filename.to_owned(),
            })
        }
    }

    fn parse(self, bytes: &[u8]) -> Result<Table, TableError> {
        match self {
            Self::Csv => Table::from_csv_reader(bytes),
            Self::Xlsx => Table::from_xlsx_bytes(bytes),
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub slot: ReferenceSlot,
    /// Data rows written.
    pub rows: usize,
    /// File that was replaced.
    pub path: PathBuf,
    /// The stored table, kept for the employee mapping preview.
    pub preview: Option<Table>,
}

impl IngestReport {
    /// Confirmation shown to the administrator.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.slot {
            ReferenceSlot::Distributors => "Distributors updated.",
            ReferenceSlot::Products => "Products updated.",
            ReferenceSlot::Users => "User credentials updated.",
            ReferenceSlot::EmployeeMapping => "Employee-distributor mapping updated.",
        }
    }
}

/// Parse an uploaded file and overwrite the slot's reference file.
///
/// # Errors
///
/// Returns `IngestError` if the format is unsupported, the file cannot be
/// parsed, a required column is missing, or the reference file cannot be
/// written. The existing file is left untouched in every error case.
#[instrument(skip(files, bytes), fields(slot = %slot, size = bytes.len()))]
pub fn ingest(
    files: &ReferenceFiles,
    slot: ReferenceSlot,
    filename: &str,
    bytes: &[u8],
) -> Result<IngestReport, IngestError> {
    let format = UploadFormat::from_filename(filename)?;
    let table = format.parse(bytes).map_err(IngestError::Parse)?;

    if let Some(column) = table.missing_columns(slot.required_columns()).first().copied() {
        return Err(IngestError::MissingColumn { slot, column });
    }

    let path = files.path(slot);
    save(&table, path)?;

    tracing::info!(rows = table.rows().len(), path = %path.display(), "reference file replaced");

    Ok(IngestReport {
        slot,
        rows: table.rows().len(),
        path: path.to_path_buf(),
        preview: (slot == ReferenceSlot::EmployeeMapping).then_some(table),
    })
}

fn save(table: &Table, path: &Path) -> Result<(), IngestError> {
    table.write_csv_path(path).map_err(|source| IngestError::Save {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(UploadFormat::from_filename("users.CSV").unwrap(), UploadFormat::Csv);
        assert_eq!(
            UploadFormat::from_filename("Products.xlsx").unwrap(),
            UploadFormat::Xlsx
        );
        assert!(matches!(
            UploadFormat::from_filename("products.xls"),
            Err(IngestError::UnsupportedFormat { .. })
        ));
        assert!(UploadFormat::from_filename("csv").is_err());
    }

    #[test]
    fn test_ingest_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = ReferenceFiles::in_dir(dir.path());
        std::fs::write(&files.distributors, "Distributor\nOld\n").unwrap();

        let report = ingest(
            &files,
            ReferenceSlot::Distributors,
            "dist.csv",
            b"Distributor,Region\nD7,West\nD8,East\n",
        )
        .unwrap();

        assert_eq!(report.rows, 2);
        assert!(report.preview.is_none());
        let written = std::fs::read_to_string(&files.distributors).unwrap();
        assert_eq!(written, "Distributor,Region\nD7,West\nD8,East\n");
    }

    #[test]
    fn test_missing_column_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let files = ReferenceFiles::in_dir(dir.path());
        std::fs::write(&files.users, "Username,Password,Role\na,b,employee\n").unwrap();

        let err = ingest(
            &files,
            ReferenceSlot::Users,
            "users.csv",
            b"Username,Password\nx,y\n",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            IngestError::MissingColumn {
                column: "Role",
                ..
            }
        ));
        let kept = std::fs::read_to_string(&files.users).unwrap();
        assert!(kept.contains("a,b,employee"));
    }

    #[test]
    fn test_mapping_upload_has_preview() {
        let dir = tempfile::tempdir().unwrap();
        let files = ReferenceFiles::in_dir(dir.path());

        let report = ingest(
            &files,
            ReferenceSlot::EmployeeMapping,
            "map.csv",
            b"Employee,Distributor\nAsha,D1\nAsha,D2\n",
        )
        .unwrap();

        assert_eq!(report.message(), "Employee-distributor mapping updated.");
        let preview = report.preview.as_ref().unwrap();
        assert_eq!(preview.rows().len(), 2);
    }
}

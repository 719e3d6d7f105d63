//! Reference data loaded from the local spreadsheet files.
//!
//! Loading never fails: a missing or broken file degrades to the built-in
//! defaults (distributors, products), an empty table (users, mapping) and a
//! warning.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use field_orders_core::{EmployeeMapping, ReferenceList, ReferenceSlot};
use thiserror::Error;
use tracing::instrument;

use super::auth::CredentialStore;
use super::table::{Table, TableError};
use crate::config::ReferenceFiles;

/// Why a reference file could not be used.
#[derive(Debug, Error)]
pub enum ReferenceLoadError {
    /// The file does not exist yet.
    #[error("{} file {} not found. Please upload it from the admin panel.", .slot.label(), .path.display())]
    Missing { slot: ReferenceSlot, path: PathBuf },

    /// The file exists but could not be parsed.
    #[error("Failed to load {} file: {source}", .slot.label())]
    Unreadable {
        slot: ReferenceSlot,
        #[source]
        source: TableError,
    },

    /// The file lacks a required column.
    #[error("{} file is missing column '{column}'", .slot.label())]
    MissingColumn {
        slot: ReferenceSlot,
        column: &'static str,
    },
}

/// Everything the order form and login page read from the reference files.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub distributors: ReferenceList,
    pub products: ReferenceList,
    pub credentials: CredentialStore,
    pub mapping: EmployeeMapping,
    /// Problems worth showing an administrator.
    pub warnings: Vec<String>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            distributors: ReferenceList::default_distributors(),
            products: ReferenceList::default_products(),
            credentials: CredentialStore::default(),
            mapping: EmployeeMapping::default(),
            warnings: Vec::new(),
        }
    }
}

impl ReferenceData {
    /// Load all four reference files.
    #[instrument(skip(files))]
    pub fn load(files: &ReferenceFiles) -> Self {
        let mut data = Self::default();

        match read_slot(files, ReferenceSlot::Distributors) {
            Ok(table) => data.distributors = list_column(&table, "Distributor"),
            Err(ReferenceLoadError::Missing { .. }) => {
                tracing::debug!("no distributor file, using defaults");
            }
            Err(e) => tracing::warn!(error = %e, "using default distributors"),
        }

        match read_slot(files, ReferenceSlot::Products) {
            Ok(table) => data.products = list_column(&table, "Product"),
            Err(ReferenceLoadError::Missing { .. }) => {
                tracing::debug!("no product file, using defaults");
            }
            Err(e) => tracing::warn!(error = %e, "using default products"),
        }

        match read_slot(files, ReferenceSlot::Users) {
            Ok(table) => data.credentials = CredentialStore::from_table(&table),
            Err(e) => {
                tracing::warn!(error = %e, "only the administrator account is available");
                data.warnings.push(e.to_string());
            }
        }

        match read_slot(files, ReferenceSlot::EmployeeMapping) {
            Ok(table) => data.mapping = mapping_from_table(&table),
            Err(ReferenceLoadError::Missing { .. }) => {
                tracing::debug!("no employee mapping file, all distributors offered");
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring employee mapping");
                data.warnings.push(e.to_string());
            }
        }

        tracing::info!(
            distributors = data.distributors.len(),
            products = data.products.len(),
            users = data.credentials.user_count(),
            mappings = data.mapping.entries().len(),
            "reference data loaded"
        );
        data
    }
}

/// Read one slot's file and check its columns.
///
/// # Errors
///
/// Returns `ReferenceLoadError` if the file is missing, unparseable, or lacks
/// one of the slot's required columns.
pub fn read_slot(files: &ReferenceFiles, slot: ReferenceSlot) -> Result<Table, ReferenceLoadError> {
    let path = files.path(slot);
    if !path.exists() {
        return Err(ReferenceLoadError::Missing {
            slot,
            path: path.to_path_buf(),
        });
    }

    let table = Table::read_csv_path(path)
        .map_err(|source| ReferenceLoadError::Unreadable { slot, source })?;

    if let Some(column) = table.missing_columns(slot.required_columns()).first().copied() {
        return Err(ReferenceLoadError::MissingColumn { slot, column });
    }
    Ok(table)
}

fn list_column(table: &Table, column: &str) -> ReferenceList {
    ReferenceList::from_values(table.column(column).unwrap_or_default())
}

fn mapping_from_table(table: &Table) -> EmployeeMapping {
    let employees = table.column("Employee").unwrap_or_default();
    let distributors = table.column("Distributor").unwrap_or_default();
    EmployeeMapping::from_pairs(employees.into_iter().zip(distributors))
}

// =============================================================================
// Shared store
// =============================================================================

/// Shared, reloadable snapshot of the reference data.
///
/// Readers take a cheap `Arc` clone; a reload builds a complete new snapshot
/// before swapping it in.
#[derive(Debug)]
pub struct ReferenceStore {
    files: ReferenceFiles,
    current: RwLock<Arc<ReferenceData>>,
}

impl ReferenceStore {
    /// Load the files once and keep the result.
    #[must_use]
    pub fn load(files: ReferenceFiles) -> Self {
        let data = ReferenceData::load(&files);
        Self {
            files,
            current: RwLock::new(Arc::new(data)),
        }
    }

    /// The reference file locations.
    #[must_use]
    pub const fn files(&self) -> &ReferenceFiles {
        &self.files
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ReferenceData> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Re-read every file and publish the new snapshot.
    pub fn reload(&self) -> Arc<ReferenceData> {
        let data = Arc::new(ReferenceData::load(&self.files));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&data);
        data
    }
}

//! Business logic services for the portal.
//!
//! # Services
//!
//! - `auth` - Credential store and login checks
//! - `ingest` - Administrator uploads of reference spreadsheets
//! - `orders` - Order form parsing, scoping and validation
//! - `persist` - Photo storage, remote upload and ledger append
//! - `reference` - Reference data loading and the shared snapshot
//! - `table` - CSV / XLSX tables

pub mod auth;
pub mod ingest;
pub mod orders;
pub mod persist;
pub mod reference;
pub mod table;

pub use auth::{AuthError, CredentialStore};
pub use ingest::{IngestError, IngestReport, ingest};
pub use orders::{FormOptions, FormStage, SubmittedForm};
pub use persist::{
    FileStore, FileStoreError, LedgerBackend, LedgerError, PersistError, PersistOutcome,
    PhotoDirectory, Persister,
};
pub use reference::{ReferenceData, ReferenceLoadError, ReferenceStore};
pub use table::{Table, TableError};

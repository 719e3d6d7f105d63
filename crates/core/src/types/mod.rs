//! Core types for Field Orders.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the portal and the CLI.

pub mod credential;
pub mod ledger;
pub mod order;
pub mod photo;
pub mod reference;
pub mod role;

pub use credential::Credential;
pub use ledger::{LEDGER_COLUMNS, LedgerRow, LedgerValue, ProductCell};
pub use order::{OrderDraft, OrderSubmission, ProductLine, SubmissionError};
pub use photo::{
    Photo, PhotoKind, TIMESTAMP_FORMAT, photo_filename, sanitize_shop_name, timestamp_label,
};
pub use reference::{
    DEFAULT_DISTRIBUTORS, DEFAULT_PRODUCTS, EmployeeMapping, MappingEntry, ReferenceList,
    ReferenceSlot, UnknownSlot,
};
pub use role::Role;

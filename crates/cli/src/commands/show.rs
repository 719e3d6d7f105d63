//! Reference data inspection.
//!
//! `fo-cli show` loads the reference files exactly as the portal does at
//! startup and prints what an employee would be offered. `fo-cli show <slot>`
//! prints one table with its cells comma separated.

use std::io::{self, Write};

use field_orders_core::ReferenceSlot;
use field_orders_portal::config::ConfigError;
use field_orders_portal::services::reference::read_slot;
use field_orders_portal::services::{ReferenceData, ReferenceLoadError};
use thiserror::Error;

/// Errors that can occur while printing reference data.
#[derive(Debug, Error)]
pub enum ShowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] ReferenceLoadError),

    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Print a summary of every reference slot.
///
/// # Errors
///
/// Returns `ShowError` if configuration is invalid or stdout is closed.
pub fn summary() -> Result<(), ShowError> {
    let files = super::reference_files()?;
    let data = ReferenceData::load(&files);
    let mut out = io::stdout().lock();

    writeln!(out, "Distributors ({}):", data.distributors.len())?;
    for name in data.distributors.iter() {
        writeln!(out, "  {name}")?;
    }

    writeln!(out, "Products ({}):", data.products.len())?;
    for name in data.products.iter() {
        writeln!(out, "  {name}")?;
    }

    // The built-in admin account is not listed
    writeln!(out, "Users ({}):", data.credentials.user_count())?;
    for cred in data.credentials.users() {
        writeln!(out, "  {} ({})", cred.username(), cred.role())?;
    }

    writeln!(out, "Employee mapping ({}):", data.mapping.entries().len())?;
    for entry in data.mapping.entries() {
        let distributor = entry.distributor.as_deref().unwrap_or("(none)");
        writeln!(out, "  {} -> {distributor}", entry.employee)?;
    }

    for warning in &data.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(())
}

/// Print one slot's table, header row first.
///
/// # Errors
///
/// Returns `ShowError` if the file is missing, invalid, or cannot be printed.
pub fn table(slot: ReferenceSlot) -> Result<(), ShowError> {
    let files = super::reference_files()?;
    let table = read_slot(&files, slot)?;
    let mut out = io::stdout().lock();

    writeln!(out, "{}", table.headers().join(","))?;
    for row in table.rows() {
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

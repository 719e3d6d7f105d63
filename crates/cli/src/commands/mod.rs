//! Subcommand implementations.

pub mod import;
pub mod login;
pub mod show;

use field_orders_portal::config::{ConfigError, PortalConfig, ReferenceFiles};

/// Reference file paths from the environment (and `.env`).
///
/// # Errors
///
/// Returns `ConfigError` if a portal variable is set but invalid.
pub fn reference_files() -> Result<ReferenceFiles, ConfigError> {
    PortalConfig::from_env().map(|config| config.files)
}

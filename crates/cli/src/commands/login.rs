//! Login check.
//!
//! Reads a password from the first line of stdin and checks it against the
//! users file the portal would load, printing the role on success.

use std::io::{self, BufRead, Write};

use field_orders_portal::config::ConfigError;
use field_orders_portal::services::{AuthError, ReferenceData};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur during a login check.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Check `username` with a password read from stdin.
///
/// # Errors
///
/// Returns `LoginError::Auth` when the pair is rejected.
pub fn check(username: &str) -> Result<(), LoginError> {
    let files = super::reference_files()?;
    let password = read_password(io::stdin().lock())?;

    let data = ReferenceData::load(&files);
    let role = data
        .credentials
        .authenticate(username, password.expose_secret())?;

    writeln!(io::stdout().lock(), "{username}: {role}")?;
    Ok(())
}

/// First line of `input`, without the line ending.
fn read_password(mut input: impl BufRead) -> io::Result<SecretString> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']).to_owned();
    Ok(SecretString::from(trimmed))
}

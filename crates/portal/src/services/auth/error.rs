//! Login error types.

use thiserror::Error;

/// Errors that can occur when authenticating a login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. The two cases are deliberately
    /// indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,
}

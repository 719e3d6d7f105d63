//! Login credentials.

use secrecy::{ExposeSecret, SecretString};

use super::role::Role;

/// A username/password/role triple loaded from the users file.
///
/// Passwords are compared in plain text. The password is kept in a
/// `SecretString` so it never shows up in `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Credential {
    username: String,
    password: SecretString,
    role: Role,
}

impl Credential {
    /// Create a credential.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            role,
        }
    }

    /// The login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The role granted on successful login.
    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Exact, case-sensitive password comparison.
    #[must_use]
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password.expose_secret() == candidate
    }
}

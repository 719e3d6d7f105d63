//! Credential store and login checks.
//!
//! One built-in administrator account plus the employee accounts loaded from
//! the users file. Passwords are compared as plain text.

mod error;

pub use error::AuthError;

use std::collections::HashMap;

use field_orders_core::{Credential, Role};
use tracing::instrument;

use super::table::Table;

/// Username of the built-in administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// Password of the built-in administrator.
const ADMIN_PASSWORD: &str = "admin";

/// Column names in the users file.
const USERNAME_COLUMN: &str = "Username";
const PASSWORD_COLUMN: &str = "Password";
const ROLE_COLUMN: &str = "Role";

/// Credentials a login attempt is checked against.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    admin: Credential,
    users: HashMap<String, Credential>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

impl CredentialStore {
    /// Build a store from loaded credentials.
    ///
    /// Rows for the reserved `admin` username are dropped. When a username
    /// appears more than once the later row replaces the earlier one.
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let users = credentials
            .into_iter()
            .filter(|cred| cred.username() != ADMIN_USERNAME)
            .map(|cred| (cred.username().to_owned(), cred))
            .collect();

        Self {
            admin: Credential::new(ADMIN_USERNAME, ADMIN_PASSWORD, Role::Admin),
            users,
        }
    }

    /// Build a store from a users table.
    ///
    /// The caller has already checked the `Username`, `Password` and `Role`
    /// columns exist; rows with a blank username are skipped. Cells are taken
    /// as text, so a numeric password like `1234` matches the typed string.
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        let (Some(user_idx), Some(pass_idx), Some(role_idx)) = (
            table.column_index(USERNAME_COLUMN),
            table.column_index(PASSWORD_COLUMN),
            table.column_index(ROLE_COLUMN),
        ) else {
            return Self::default();
        };

        Self::new(table.rows().iter().filter_map(|row| {
            let username = cell(row, user_idx).trim().to_owned();
            if username.is_empty() {
                return None;
            }
            Some(Credential::new(
                username,
                cell(row, pass_idx),
                Role::from(cell(row, role_idx)),
            ))
        }))
    }

    /// Check a username/password pair.
    ///
    /// The administrator account is checked first, then the loaded table.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown or the
    /// password does not match exactly.
    #[instrument(skip(self, password), fields(username = %username))]
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Role, AuthError> {
        if username == self.admin.username() && self.admin.password_matches(password) {
            return Ok(Role::Admin);
        }

        match self.users.get(username) {
            Some(cred) if cred.password_matches(password) => Ok(cred.role().clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Number of loaded (non-admin) accounts.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Loaded accounts sorted by username, for display.
    #[must_use]
    pub fn users(&self) -> Vec<&Credential> {
        let mut users: Vec<&Credential> = self.users.values().collect();
        users.sort_by(|a, b| a.username().cmp(b.username()));
        users
    }
}

fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).cloned().unwrap_or_default()
}

//! Session-related types.
//!
//! Types stored in the session for authentication state.

use field_orders_core::Role;
use serde::{Deserialize, Serialize};

use crate::services::FormStage;

/// Session-stored user identity.
///
/// Set once on a successful login and removed on logout. An absent value
/// means the caller is not logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Username as typed at login.
    pub username: String,
    /// Role resolved by the credential store.
    pub role: Role,
}

impl CurrentUser {
    /// The workflow stage this user lands on.
    #[must_use]
    pub const fn stage(&self) -> FormStage {
        FormStage::entry(Some(&self.role))
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

//! User roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role attached to a credential.
///
/// The users file may contain any role string. Only `admin` and `employee`
/// unlock a view in the portal; every other value is kept verbatim so it can
/// still be displayed and round-tripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Reference data administrator (uploads the four spreadsheets).
    Admin,
    /// Field sales employee (fills in the order form).
    Employee,
    /// Any other role string loaded from the users file.
    Other(String),
}

impl Role {
    /// Returns the role as it appears in the users file.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Other(role) => role,
        }
    }

    /// Returns true for the administrator role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true for the employee role.
    #[must_use]
    pub const fn is_employee(&self) -> bool {
        matches!(self, Self::Employee)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim() {
            "admin" => Self::Admin,
            "employee" => Self::Employee,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(role) => role,
            known => known.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_roles_parse() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from(" employee "), Role::Employee);
    }

    #[test]
    fn test_roles_are_case_sensitive() {
        assert_eq!(Role::from("Employee"), Role::Other("Employee".to_string()));
    }

    #[test]
    fn test_other_role_round_trips() {
        let role = Role::from("supervisor");
        assert_eq!(role.to_string(), "supervisor");
        assert!(!role.is_admin());
        assert!(!role.is_employee());

        let json = serde_json::to_string(&role).expect("serialize");
        assert_eq!(json, "\"supervisor\"");
        let back: Role = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, role);
    }
}

//! Admin-maintained reference data.
//!
//! Distributor and product lists are ordered sets of names. The employee
//! mapping relates employee identities to the distributors they serve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Distributors offered when no distributor file has been uploaded.
pub const DEFAULT_DISTRIBUTORS: &[&str] = &["D1", "D2", "D3"];

/// Products offered when no product file has been uploaded.
pub const DEFAULT_PRODUCTS: &[&str] = &[
    "Donut Cake",
    "Chocochip Muffin",
    "Banana Muffin",
    "Brownie",
];

/// The four reference spreadsheets an administrator can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSlot {
    /// Distributor names (column `Distributor`).
    Distributors,
    /// Product names (column `Product`).
    Products,
    /// Login credentials (columns `Username`, `Password`, `Role`).
    Users,
    /// Employee to distributor relation (columns `Employee`, `Distributor`).
    EmployeeMapping,
}

impl ReferenceSlot {
    /// Every slot, in the order the admin panel shows them.
    pub const ALL: [Self; 4] = [
        Self::Distributors,
        Self::Products,
        Self::Users,
        Self::EmployeeMapping,
    ];

    /// URL-safe identifier used in routes and on the command line.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Distributors => "distributors",
            Self::Products => "products",
            Self::Users => "users",
            Self::EmployeeMapping => "employee-mapping",
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Distributors => "Distributors",
            Self::Products => "Products",
            Self::Users => "Users",
            Self::EmployeeMapping => "Employee Mapping",
        }
    }

    /// Header names the uploaded table must contain.
    #[must_use]
    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Distributors => &["Distributor"],
            Self::Products => &["Product"],
            Self::Users => &["Username", "Password", "Role"],
            Self::EmployeeMapping => &["Employee", "Distributor"],
        }
    }
}

impl fmt::Display for ReferenceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when parsing an unknown slot name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown reference slot: {0} (expected distributors, products, users or employee-mapping)")]
pub struct UnknownSlot(pub String);

impl FromStr for ReferenceSlot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.slug() == s)
            .ok_or_else(|| UnknownSlot(s.to_owned()))
    }
}

/// An ordered list of unique, non-blank names.
///
/// Insertion order from the source file is preserved; later duplicates are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceList(Vec<String>);

impl ReferenceList {
    /// Build a list from raw cell values, trimming and de-duplicating.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for value in values {
            let name = value.as_ref().trim();
            if !name.is_empty() && !names.iter().any(|existing| existing == name) {
                names.push(name.to_owned());
            }
        }
        Self(names)
    }

    /// The built-in distributor list.
    #[must_use]
    pub fn default_distributors() -> Self {
        Self::from_values(DEFAULT_DISTRIBUTORS)
    }

    /// The built-in product list.
    #[must_use]
    pub fn default_products() -> Self {
        Self::from_values(DEFAULT_PRODUCTS)
    }

    /// Names in source order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns true if `name` is in the list.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the list has no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One row of the employee mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Employee identity as typed in the mapping file.
    pub employee: String,
    /// Distributor served by the employee; `None` for a blank cell.
    pub distributor: Option<String>,
}

/// Employee to distributor relation.
///
/// Restricts which employee identity a logged-in user may claim and which
/// distributors they may pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeMapping {
    entries: Vec<MappingEntry>,
}

impl EmployeeMapping {
    /// Build a mapping from `(employee, distributor)` cell pairs.
    ///
    /// Rows with a blank employee are ignored. Blank distributors are kept so
    /// the employee still counts as mapped.
    pub fn from_pairs<I, E, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, D)>,
        E: AsRef<str>,
        D: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .filter_map(|(employee, distributor)| {
                let employee = employee.as_ref().trim();
                if employee.is_empty() {
                    return None;
                }
                let distributor = distributor.as_ref().trim();
                Some(MappingEntry {
                    employee: employee.to_owned(),
                    distributor: (!distributor.is_empty()).then(|| distributor.to_owned()),
                })
            })
            .collect();
        Self { entries }
    }

    /// Raw rows in file order.
    #[must_use]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Returns true if no rows were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Employee identities a logged-in user may select.
    ///
    /// Only identities equal to the session's own username qualify, so the
    /// result is either empty or a single name.
    #[must_use]
    pub fn employee_names_for(&self, username: &str) -> Vec<String> {
        ReferenceList::from_values(
            self.entries
                .iter()
                .filter(|entry| entry.employee == username)
                .map(|entry| entry.employee.as_str()),
        )
        .0
    }

    /// Distributors mapped to `employee`, unique and in file order.
    #[must_use]
    pub fn distributors_for(&self, employee: &str) -> ReferenceList {
        ReferenceList::from_values(
            self.entries
                .iter()
                .filter(|entry| entry.employee == employee)
                .filter_map(|entry| entry.distributor.as_deref()),
        )
    }

    /// Distributor choices for `employee`, falling back to `all` when the
    /// mapping is empty, no employee is selected, or the employee has no
    /// mapped distributor.
    #[must_use]
    pub fn distributor_choices(&self, employee: Option<&str>, all: &ReferenceList) -> ReferenceList {
        match employee {
            Some(name) if !self.is_empty() => {
                let mapped = self.distributors_for(name);
                if mapped.is_empty() { all.clone() } else { mapped }
            }
            _ => all.clone(),
        }
    }
}

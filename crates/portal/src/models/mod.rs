//! Domain models for the portal.
//!
//! Request-scoped types that are not part of the shared core crate.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};

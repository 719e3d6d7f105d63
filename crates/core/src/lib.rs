//! Field Orders Core - Shared domain types.
//!
//! This crate provides the types used by every Field Orders component:
//! - `portal` - The web portal (login, admin uploads, order form)
//! - `cli` - Command-line tools for importing and inspecting reference data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no file access. Loading, persistence and rendering live in the
//! portal crate.
//!
//! # Modules
//!
//! - [`types`] - Roles, credentials, reference lists, order drafts and ledger rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

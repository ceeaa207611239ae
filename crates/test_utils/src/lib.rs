//! Test Utilities Crate
//!
//! Shared test infrastructure for the school fees workspace.
//!
//! # Modules
//!
//! - `fixtures`: well-known ids and a seeded set of in-memory ports
//! - `builders`: builders for payments, accounts and fee types
//! - `assertions`: assertion helpers for payment invariants
//! - `generators`: proptest strategies

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;

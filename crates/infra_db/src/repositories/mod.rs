//! Repository implementations
//!
//! Repositories own the SQL. They speak in row types and [`DatabaseError`];
//! the adapters in [`crate::adapters`] translate to domain types.
//!
//! [`DatabaseError`]: crate::DatabaseError

pub mod accounts;
pub mod directory;
pub mod payments;

pub use accounts::AccountRepository;
pub use directory::DirectoryRepository;
pub use payments::PaymentRepository;

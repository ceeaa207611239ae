//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the school fee payment core, using SQLx.
//!
//! # Layout
//!
//! - [`repositories`] hold the SQL and row types
//! - [`adapters`] implement the `domain_payments` storage ports on top of them
//! - [`pool`] creates the connection pool and applies the embedded migrations
//!
//! # Concurrency
//!
//! Payment status changes are single conditional `UPDATE` statements, so two
//! concurrent verifications of one reference cannot both apply. Primary
//! account changes run in a transaction that locks the school row, and a
//! deferred exclusion constraint rejects a second primary at commit.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresPaymentStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/school_fees")).await?;
//! run_migrations(&pool).await?;
//! let payments = PostgresPaymentStore::new(pool.clone());
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresAccountStore, PostgresPaymentStore, PostgresSchoolDirectory};
pub use error::{db_to_port_error, DatabaseError};
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};

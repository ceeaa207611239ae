//! Domain Adapters
//!
//! Implementations of the `domain_payments` ports on PostgreSQL. Each adapter
//! wraps a repository, converts rows to domain types and translates
//! [`DatabaseError`](crate::DatabaseError) into `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPaymentStore;
//! use domain_payments::PaymentStore;
//!
//! let store: Arc<dyn PaymentStore> = Arc::new(PostgresPaymentStore::new(pool));
//! let payment = store.find_by_reference("PAY-1718035200123-42-9f2c41d0").await?;
//! ```

pub mod accounts;
pub mod directory;
pub mod payments;

pub use accounts::PostgresAccountStore;
pub use directory::PostgresSchoolDirectory;
pub use payments::PostgresPaymentStore;

use std::time::Instant;

use sqlx::PgPool;

use core_kernel::HealthCheckResult;

/// Runs `SELECT 1` and reports the round trip
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {e}")),
    }
}

//! PostgreSQL payment store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    Currency, DomainPort, FeeTypeId, HealthCheckResult, HealthCheckable, PaymentId, PortError,
    SchoolId, SessionId, StudentId,
};
use domain_payments::{
    NewPayment, Payment, PaymentMethod, PaymentStats, PaymentStatus, PaymentStore,
    StatusTransition,
};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::payments::{
    NewPaymentRow, PaymentMethod as DbPaymentMethod, PaymentRepository, PaymentRow,
    PaymentStatsRow, PaymentStatus as DbPaymentStatus,
};

/// PostgreSQL-backed implementation of [`PaymentStore`]
#[derive(Debug, Clone)]
pub struct PostgresPaymentStore {
    repository: PaymentRepository,
    pool: PgPool,
}

impl PostgresPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PaymentRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &PaymentRepository {
        &self.repository
    }
}

impl DomainPort for PostgresPaymentStore {}

#[async_trait]
impl HealthCheckable for PostgresPaymentStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-payment-store").await
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    #[instrument(skip(self, payment), fields(reference = %payment.reference, school_id = %payment.school_id))]
    async fn insert(&self, payment: NewPayment) -> Result<Payment, PortError> {
        debug!("inserting payment");
        let row = self
            .repository
            .insert(NewPaymentRow {
                school_id: payment.school_id.value(),
                student_id: payment.student_id.value(),
                fee_type_id: payment.fee_type_id.value(),
                session_id: payment.session_id.map(|s| s.value()),
                reference: payment.reference,
                amount: payment.amount,
                currency: payment.currency.code().to_string(),
                payment_method: domain_to_db_method(payment.payment_method),
                status: domain_to_db_status(payment.status),
                paid_at: payment.paid_at,
            })
            .await
            .map_err(db_to_port_error)?;
        row_to_payment(row)
    }

    #[instrument(skip(self))]
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, PortError> {
        self.repository
            .find_by_reference(reference)
            .await
            .map_err(db_to_port_error)?
            .map(row_to_payment)
            .transpose()
    }

    #[instrument(skip(self), fields(school_id = %school_id, payment_id = %payment_id))]
    async fn find_for_school(
        &self,
        school_id: SchoolId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, PortError> {
        self.repository
            .find_for_school(school_id.value(), payment_id.value())
            .await
            .map_err(db_to_port_error)?
            .map(row_to_payment)
            .transpose()
    }

    #[instrument(skip(self), fields(school_id = %school_id))]
    async fn list_for_school(
        &self,
        school_id: SchoolId,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>, PortError> {
        self.repository
            .list_for_school(school_id.value(), status.map(domain_to_db_status))
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_payment)
            .collect()
    }

    #[instrument(skip(self), fields(school_id = %school_id, student_id = %student_id))]
    async fn list_for_student(
        &self,
        school_id: SchoolId,
        student_id: StudentId,
    ) -> Result<Vec<Payment>, PortError> {
        self.repository
            .list_for_student(school_id.value(), student_id.value())
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_payment)
            .collect()
    }

    #[instrument(skip(self), fields(school_id = %school_id))]
    async fn stats_for_school(&self, school_id: SchoolId) -> Result<PaymentStats, PortError> {
        let row = self
            .repository
            .stats_for_school(school_id.value())
            .await
            .map_err(db_to_port_error)?;
        Ok(row_to_stats(row))
    }

    #[instrument(skip(self, transition), fields(from = %transition.from, to = %transition.to))]
    async fn transition(
        &self,
        reference: &str,
        transition: &StatusTransition,
    ) -> Result<Option<Payment>, PortError> {
        let updated = self
            .repository
            .transition(
                reference,
                domain_to_db_status(transition.from),
                domain_to_db_status(transition.to),
                transition.gateway_reference.as_deref(),
                transition.paid_at,
                transition.refunded_at,
            )
            .await
            .map_err(db_to_port_error)?;

        if updated.is_none() {
            debug!("status already moved on; transition not applied");
        }
        updated.map(row_to_payment).transpose()
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn row_to_payment(row: PaymentRow) -> Result<Payment, PortError> {
    let currency: Currency = row
        .currency
        .trim()
        .parse()
        .map_err(|_| db_to_port_error(DatabaseError::InvalidData(format!(
            "payment {} has unknown currency '{}'",
            row.id, row.currency
        ))))?;

    Ok(Payment {
        id: PaymentId::new(row.id),
        school_id: SchoolId::new(row.school_id),
        student_id: StudentId::new(row.student_id),
        fee_type_id: FeeTypeId::new(row.fee_type_id),
        session_id: row.session_id.map(SessionId::new),
        reference: row.reference,
        amount: row.amount,
        currency,
        payment_method: db_to_domain_method(row.payment_method),
        status: db_to_domain_status(row.status),
        gateway_reference: row.gateway_reference,
        paid_at: row.paid_at,
        refunded_at: row.refunded_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_stats(row: PaymentStatsRow) -> PaymentStats {
    let count = |n: i64| u64::try_from(n).unwrap_or(0);
    PaymentStats {
        total_payments: count(row.total_payments),
        successful_count: count(row.successful_count),
        pending_count: count(row.pending_count),
        failed_count: count(row.failed_count),
        refunded_count: count(row.refunded_count),
        total_revenue: row.total_revenue,
        total_amount: row.total_amount,
    }
}

fn domain_to_db_status(status: PaymentStatus) -> DbPaymentStatus {
    match status {
        PaymentStatus::Pending => DbPaymentStatus::Pending,
        PaymentStatus::Successful => DbPaymentStatus::Successful,
        PaymentStatus::Failed => DbPaymentStatus::Failed,
        PaymentStatus::Refunded => DbPaymentStatus::Refunded,
    }
}

fn db_to_domain_status(status: DbPaymentStatus) -> PaymentStatus {
    match status {
        DbPaymentStatus::Pending => PaymentStatus::Pending,
        DbPaymentStatus::Successful => PaymentStatus::Successful,
        DbPaymentStatus::Failed => PaymentStatus::Failed,
        DbPaymentStatus::Refunded => PaymentStatus::Refunded,
    }
}

fn domain_to_db_method(method: PaymentMethod) -> DbPaymentMethod {
    match method {
        PaymentMethod::Paystack => DbPaymentMethod::Paystack,
        PaymentMethod::Manual => DbPaymentMethod::Manual,
    }
}

fn db_to_domain_method(method: DbPaymentMethod) -> PaymentMethod {
    match method {
        DbPaymentMethod::Paystack => PaymentMethod::Paystack,
        DbPaymentMethod::Manual => PaymentMethod::Manual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn row(currency: &str) -> PaymentRow {
        let now = Utc::now();
        PaymentRow {
            id: 17,
            school_id: 1,
            student_id: 42,
            fee_type_id: 7,
            session_id: Some(3),
            reference: "PAY-1718035200123-42-9f2c41d0".to_string(),
            amount: dec!(5000.00),
            currency: currency.to_string(),
            payment_method: DbPaymentMethod::Paystack,
            status: DbPaymentStatus::Successful,
            gateway_reference: Some("4099260516".to_string()),
            paid_at: Some(now),
            refunded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_to_payment() {
        let payment = row_to_payment(row("NGN")).unwrap();
        assert_eq!(payment.id, PaymentId::new(17));
        assert_eq!(payment.session_id, Some(SessionId::new(3)));
        assert_eq!(payment.currency, Currency::NGN);
        assert_eq!(payment.status, PaymentStatus::Successful);
        assert_eq!(payment.payment_method, PaymentMethod::Paystack);
        assert!(payment.is_consistent());
    }

    #[test]
    fn test_refunded_row_carries_refunded_at() {
        let mut refunded = row("NGN");
        refunded.status = DbPaymentStatus::Refunded;
        refunded.refunded_at = refunded.paid_at.take();

        let payment = row_to_payment(refunded).unwrap();
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert!(payment.paid_at.is_none());
        assert!(payment.refunded_at.is_some());
        assert!(payment.is_consistent());
    }

    #[test]
    fn test_unknown_currency_is_transformation_error() {
        let err = row_to_payment(row("XYZ")).unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[test]
    fn test_status_mapping_is_total() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Successful,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(db_to_domain_status(domain_to_db_status(status)), status);
        }
    }

    #[test]
    fn test_stats_conversion() {
        let stats = row_to_stats(PaymentStatsRow {
            total_payments: 4,
            successful_count: 2,
            pending_count: 1,
            failed_count: 1,
            refunded_count: 0,
            total_revenue: dec!(10000),
            total_amount: dec!(17500),
        });
        assert_eq!(stats.total_payments, 4);
        assert_eq!(stats.successful_count, 2);
        assert_eq!(stats.total_revenue, dec!(10000));
        assert_eq!(stats.total_amount, dec!(17500));
    }
}

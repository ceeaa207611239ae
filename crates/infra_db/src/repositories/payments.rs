//! Payment repository implementation
//!
//! Rows in `payments` are never deleted. Status changes go through
//! [`PaymentRepository::transition`], a single conditional `UPDATE` whose
//! `WHERE status = $expected` clause lets exactly one concurrent caller win.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

const PAYMENT_COLUMNS: &str = r#"
    id, school_id, student_id, fee_type_id, session_id, reference, amount,
    currency, payment_method, status, gateway_reference, paid_at,
    refunded_at, created_at, updated_at
"#;

/// Repository for payment records
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a payment row
    ///
    /// # Errors
    ///
    /// `DatabaseError::DuplicateEntry` when the reference is taken
    pub async fn insert(&self, payment: NewPaymentRow) -> Result<PaymentRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO payments (
                school_id, student_id, fee_type_id, session_id, reference,
                amount, currency, payment_method, status, paid_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment.school_id)
            .bind(payment.student_id)
            .bind(payment.fee_type_id)
            .bind(payment.session_id)
            .bind(&payment.reference)
            .bind(payment.amount)
            .bind(&payment.currency)
            .bind(payment.payment_method)
            .bind(payment.status)
            .bind(payment.paid_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentRow>, DatabaseError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1");
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_for_school(
        &self,
        school_id: i64,
        payment_id: i64,
    ) -> Result<Option<PaymentRow>, DatabaseError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND school_id = $2");
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment_id)
            .bind(school_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lists a school's payments, newest first, optionally by status
    pub async fn list_for_school(
        &self,
        school_id: i64,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE school_id = $1 AND ($2::payment_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(school_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_for_student(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE school_id = $1 AND student_id = $2
            ORDER BY created_at DESC, id DESC
            "#
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(school_id)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Counts and sums a school's payments per status in one pass
    pub async fn stats_for_school(&self, school_id: i64) -> Result<PaymentStatsRow, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentStatsRow>(
            r#"
            SELECT
                COUNT(*) AS total_payments,
                COUNT(*) FILTER (WHERE status = 'successful') AS successful_count,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_count,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed_count,
                COUNT(*) FILTER (WHERE status = 'refunded') AS refunded_count,
                COALESCE(SUM(amount) FILTER (WHERE status = 'successful'), 0) AS total_revenue,
                COALESCE(SUM(amount), 0) AS total_amount
            FROM payments
            WHERE school_id = $1
            "#,
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Moves a payment from `from` to `to` if it is still in `from`
    ///
    /// `gateway_reference` is only overwritten when given. `paid_at` and
    /// `refunded_at` are always written so they track the new status.
    ///
    /// # Returns
    ///
    /// The updated row, or `None` if the status had already changed
    pub async fn transition(
        &self,
        reference: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        gateway_reference: Option<&str>,
        paid_at: Option<DateTime<Utc>>,
        refunded_at: Option<DateTime<Utc>>,
    ) -> Result<Option<PaymentRow>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE payments
            SET status = $3,
                gateway_reference = COALESCE($4, gateway_reference),
                paid_at = $5,
                refunded_at = $6,
                updated_at = NOW()
            WHERE reference = $1 AND status = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(reference)
            .bind(from)
            .bind(to)
            .bind(gateway_reference)
            .bind(paid_at)
            .bind(refunded_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

/// Database representation of a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub school_id: i64,
    pub student_id: i64,
    pub fee_type_id: i64,
    pub session_id: Option<i64>,
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub gateway_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a payment
#[derive(Debug, Clone)]
pub struct NewPaymentRow {
    pub school_id: i64,
    pub student_id: i64,
    pub fee_type_id: i64,
    pub session_id: Option<i64>,
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Per-status aggregates for one school
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentStatsRow {
    pub total_payments: i64,
    pub successful_count: i64,
    pub pending_count: i64,
    pub failed_count: i64,
    pub refunded_count: i64,
    pub total_revenue: Decimal,
    pub total_amount: Decimal,
}

/// Payment status enum matching the database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
    Refunded,
}

/// Payment method enum matching the database type
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Paystack,
    Manual,
}

//! Business account repository implementation
//!
//! Writes that touch the primary flag lock the owning school row first, so
//! promotions and primary inserts for one school run one at a time. The
//! deferred `one_primary_per_school` exclusion constraint backs this up at
//! commit.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DatabaseError;

const ACCOUNT_COLUMNS: &str = r#"
    id, school_id, bank_name, bank_code, account_number, account_name,
    is_primary, is_verified, subaccount_code, created_at, updated_at
"#;

/// Repository for settlement bank accounts
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists a school's accounts, primary first, then newest first
    pub async fn list_for_school(&self, school_id: i64) -> Result<Vec<AccountRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM business_accounts
            WHERE school_id = $1
            ORDER BY is_primary DESC, created_at DESC, id DESC
            "#
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(school_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn primary_accounts(&self, school_id: i64) -> Result<Vec<AccountRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM business_accounts WHERE school_id = $1 AND is_primary"
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(school_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts an account, demoting the current primary in the same
    /// transaction when the new account is primary
    pub async fn insert(&self, account: NewAccountRow) -> Result<AccountRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        if account.is_primary {
            lock_school(&mut tx, account.school_id).await?;
            sqlx::query(
                r#"
                UPDATE business_accounts
                SET is_primary = FALSE, updated_at = NOW()
                WHERE school_id = $1 AND is_primary
                "#,
            )
            .bind(account.school_id)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!(
            r#"
            INSERT INTO business_accounts (
                school_id, bank_name, bank_code, account_number, account_name,
                is_primary, is_verified, subaccount_code
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account.school_id)
            .bind(&account.bank_name)
            .bind(&account.bank_code)
            .bind(&account.account_number)
            .bind(&account.account_name)
            .bind(account.is_primary)
            .bind(account.is_verified)
            .bind(&account.subaccount_code)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Makes `account_id` the school's only primary account
    ///
    /// # Returns
    ///
    /// The promoted row, or `None` if the account is not the school's
    pub async fn set_primary(
        &self,
        school_id: i64,
        account_id: i64,
    ) -> Result<Option<AccountRow>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_school(&mut tx, school_id).await?;

        let owned: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM business_accounts WHERE id = $1 AND school_id = $2",
        )
        .bind(account_id)
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE business_accounts
            SET is_primary = (id = $1), updated_at = NOW()
            WHERE school_id = $2
            "#,
        )
        .bind(account_id)
        .bind(school_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM business_accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(row))
    }
}

async fn lock_school(tx: &mut Transaction<'_, Postgres>, school_id: i64) -> Result<(), DatabaseError> {
    sqlx::query("SELECT id FROM schools WHERE id = $1 FOR UPDATE")
        .bind(school_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(())
}

/// Database representation of a settlement account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub school_id: i64,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub is_primary: bool,
    pub is_verified: bool,
    pub subaccount_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a settlement account
#[derive(Debug, Clone)]
pub struct NewAccountRow {
    pub school_id: i64,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub is_primary: bool,
    pub is_verified: bool,
    pub subaccount_code: Option<String>,
}

//! PostgreSQL settlement account store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BusinessAccountId, DomainPort, HealthCheckResult, HealthCheckable, PortError, SchoolId,
};
use domain_payments::{AccountStore, BusinessAccount, NewBusinessAccount};

use crate::error::db_to_port_error;
use crate::repositories::accounts::{AccountRepository, AccountRow, NewAccountRow};

/// PostgreSQL-backed implementation of [`AccountStore`]
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    repository: AccountRepository,
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AccountRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresAccountStore {}

#[async_trait]
impl HealthCheckable for PostgresAccountStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-account-store").await
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self), fields(school_id = %school_id))]
    async fn list_for_school(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PortError> {
        let rows = self
            .repository
            .list_for_school(school_id.value())
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_account).collect())
    }

    #[instrument(skip(self), fields(school_id = %school_id))]
    async fn primary_accounts(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PortError> {
        let rows = self
            .repository
            .primary_accounts(school_id.value())
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_account).collect())
    }

    #[instrument(skip(self, account), fields(school_id = %account.school_id, is_primary = account.is_primary))]
    async fn insert(&self, account: NewBusinessAccount) -> Result<BusinessAccount, PortError> {
        debug!("inserting settlement account");
        let row = self
            .repository
            .insert(NewAccountRow {
                school_id: account.school_id.value(),
                bank_name: account.bank_name,
                bank_code: account.bank_code,
                account_number: account.account_number,
                account_name: account.account_name,
                is_primary: account.is_primary,
                is_verified: account.is_verified,
                subaccount_code: account.subaccount_code,
            })
            .await
            .map_err(db_to_port_error)?;
        Ok(row_to_account(row))
    }

    #[instrument(skip(self), fields(school_id = %school_id, account_id = %account_id))]
    async fn set_primary(
        &self,
        school_id: SchoolId,
        account_id: BusinessAccountId,
    ) -> Result<Option<BusinessAccount>, PortError> {
        let row = self
            .repository
            .set_primary(school_id.value(), account_id.value())
            .await
            .map_err(db_to_port_error)?;
        Ok(row.map(row_to_account))
    }
}

fn row_to_account(row: AccountRow) -> BusinessAccount {
    BusinessAccount {
        id: BusinessAccountId::new(row.id),
        school_id: SchoolId::new(row.school_id),
        bank_name: row.bank_name,
        bank_code: row.bank_code,
        account_number: row.account_number,
        account_name: row.account_name,
        is_primary: row.is_primary,
        is_verified: row.is_verified,
        subaccount_code: row.subaccount_code,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_row_to_account_keeps_settlement_fields() {
        let now = Utc::now();
        let account = row_to_account(AccountRow {
            id: 3,
            school_id: 1,
            bank_name: "Access Bank".to_string(),
            bank_code: "044".to_string(),
            account_number: "0123456789".to_string(),
            account_name: "GREENFIELD ACADEMY LTD".to_string(),
            is_primary: true,
            is_verified: true,
            subaccount_code: Some("ACCT_4hl4xenwpjy5wb".to_string()),
            created_at: now,
            updated_at: now,
        });

        assert_eq!(account.id, BusinessAccountId::new(3));
        assert_eq!(account.school_id, SchoolId::new(1));
        assert_eq!(account.settlement_code(), Some("ACCT_4hl4xenwpjy5wb"));
    }
}

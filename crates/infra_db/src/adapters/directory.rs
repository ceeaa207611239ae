//! PostgreSQL school directory

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    Currency, DomainPort, FeeTypeId, HealthCheckResult, HealthCheckable, PortError, SchoolId, SessionId,
    StudentId,
};
use domain_payments::{FeeTypeRef, SchoolDirectory, SchoolRef, StudentRef};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::directory::{DirectoryRepository, FeeTypeRow};

/// Reads schools, students and fee types for the payment services
#[derive(Debug, Clone)]
pub struct PostgresSchoolDirectory {
    repository: DirectoryRepository,
    pool: PgPool,
}

impl PostgresSchoolDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DirectoryRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresSchoolDirectory {}

#[async_trait]
impl HealthCheckable for PostgresSchoolDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-school-directory").await
    }
}

#[async_trait]
impl SchoolDirectory for PostgresSchoolDirectory {
    #[instrument(skip(self), fields(school_id = %school_id))]
    async fn get_school(&self, school_id: SchoolId) -> Result<SchoolRef, PortError> {
        let row = self
            .repository
            .get_school(school_id.value())
            .await
            .map_err(db_to_port_error)?;
        Ok(SchoolRef {
            id: SchoolId::new(row.id),
            name: row.name,
            is_active: row.is_active,
        })
    }

    #[instrument(skip(self), fields(school_id = %school_id, student_id = %student_id))]
    async fn get_student(
        &self,
        school_id: SchoolId,
        student_id: StudentId,
    ) -> Result<StudentRef, PortError> {
        let row = self
            .repository
            .get_student(school_id.value(), student_id.value())
            .await
            .map_err(db_to_port_error)?;
        Ok(StudentRef {
            id: StudentId::new(row.id),
            school_id: SchoolId::new(row.school_id),
        })
    }

    #[instrument(skip(self), fields(school_id = %school_id, fee_type_id = %fee_type_id))]
    async fn get_fee_type(
        &self,
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
    ) -> Result<FeeTypeRef, PortError> {
        let row = self
            .repository
            .get_fee_type(school_id.value(), fee_type_id.value())
            .await
            .map_err(db_to_port_error)?;
        row_to_fee_type(row)
    }
}

fn row_to_fee_type(row: FeeTypeRow) -> Result<FeeTypeRef, PortError> {
    let currency: Currency = row.currency.trim().parse().map_err(|_| {
        db_to_port_error(DatabaseError::InvalidData(format!(
            "fee type {} has unknown currency '{}'",
            row.id, row.currency
        )))
    })?;
    Ok(FeeTypeRef {
        id: FeeTypeId::new(row.id),
        school_id: SchoolId::new(row.school_id),
        name: row.name,
        amount: row.amount,
        currency,
        session_id: row.session_id.map(SessionId::new),
        is_active: row.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fee_type_conversion() {
        let fee = row_to_fee_type(FeeTypeRow {
            id: 7,
            school_id: 1,
            session_id: None,
            name: "First Term Tuition".to_string(),
            amount: dec!(5000.00),
            currency: "ngn".to_string(),
            is_active: true,
        })
        .unwrap();

        assert_eq!(fee.id, FeeTypeId::new(7));
        assert_eq!(fee.currency, Currency::NGN);
        assert_eq!(fee.amount, dec!(5000));
        assert_eq!(fee.session_id, None);
    }
}

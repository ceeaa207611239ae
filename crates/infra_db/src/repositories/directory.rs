//! Read-only queries over school reference data

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

/// Repository for schools, students and fee types
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_school(&self, school_id: i64) -> Result<SchoolRow, DatabaseError> {
        sqlx::query_as::<_, SchoolRow>("SELECT id, name, is_active FROM schools WHERE id = $1")
            .bind(school_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("School", school_id))
    }

    /// Fetches a student, scoped to the school
    pub async fn get_student(&self, school_id: i64, student_id: i64) -> Result<StudentRow, DatabaseError> {
        sqlx::query_as::<_, StudentRow>(
            "SELECT id, school_id FROM students WHERE id = $1 AND school_id = $2",
        )
        .bind(student_id)
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Student", student_id))
    }

    /// Fetches a fee type, scoped to the school
    pub async fn get_fee_type(&self, school_id: i64, fee_type_id: i64) -> Result<FeeTypeRow, DatabaseError> {
        sqlx::query_as::<_, FeeTypeRow>(
            r#"
            SELECT id, school_id, session_id, name, amount, currency, is_active
            FROM fee_types
            WHERE id = $1 AND school_id = $2
            "#,
        )
        .bind(fee_type_id)
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("FeeType", fee_type_id))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SchoolRow {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub school_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeeTypeRow {
    pub id: i64,
    pub school_id: i64,
    pub session_id: Option<i64>,
    pub name: String,
    pub amount: Decimal,
    pub currency: String,
    pub is_active: bool,
}

//! Payments Domain Ports
//!
//! Storage and reference-data interfaces the payment services depend on.
//!
//! - [`SchoolDirectory`] reads schools, students and fee types owned by the
//!   CRUD layer. The payments core never writes them.
//! - [`PaymentStore`] persists payments and applies guarded status changes.
//! - [`AccountStore`] persists settlement accounts and the primary flag.
//!
//! Every lookup that returns tenant data takes the school id, and adapters
//! must filter on it.
//!
//! ```rust,ignore
//! let service = PaymentService::new(
//!     Arc::new(PostgresSchoolDirectory::new(pool.clone())),
//!     Arc::new(PostgresPaymentStore::new(pool.clone())),
//!     Arc::new(PostgresAccountStore::new(pool.clone())),
//!     Arc::new(PaystackGateway::new(paystack_config)?),
//! );
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    BusinessAccountId, Currency, DomainPort, FeeTypeId, HealthCheckable, PaymentId, PortError,
    SchoolId, SessionId, StudentId,
};

use crate::account::{BusinessAccount, NewBusinessAccount};
use crate::payment::{NewPayment, Payment, PaymentStats, PaymentStatus, StatusTransition};

/// School as seen by the payments core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolRef {
    pub id: SchoolId,
    pub name: String,
    pub is_active: bool,
}

/// Student as seen by the payments core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRef {
    pub id: StudentId,
    pub school_id: SchoolId,
}

/// Fee type as seen by the payments core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTypeRef {
    pub id: FeeTypeId,
    pub school_id: SchoolId,
    pub name: String,
    /// Authoritative base charge
    pub amount: Decimal,
    pub currency: Currency,
    pub session_id: Option<SessionId>,
    pub is_active: bool,
}

/// Read-only access to school reference data
#[async_trait]
pub trait SchoolDirectory: DomainPort {
    /// Retrieves a school
    ///
    /// # Returns
    ///
    /// The school, or `PortError::NotFound`
    async fn get_school(&self, school_id: SchoolId) -> Result<SchoolRef, PortError>;

    /// Retrieves a student enrolled in the given school
    ///
    /// A student of another school is reported as `PortError::NotFound`.
    async fn get_student(
        &self,
        school_id: SchoolId,
        student_id: StudentId,
    ) -> Result<StudentRef, PortError>;

    /// Retrieves a fee type defined by the given school
    async fn get_fee_type(
        &self,
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
    ) -> Result<FeeTypeRef, PortError>;
}

/// Persistence for payment records
#[async_trait]
pub trait PaymentStore: DomainPort + HealthCheckable {
    /// Stores a new payment
    ///
    /// # Returns
    ///
    /// The stored payment, or `PortError::Conflict` if the reference exists
    async fn insert(&self, payment: NewPayment) -> Result<Payment, PortError>;

    /// Looks a payment up by its platform reference
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, PortError>;

    /// Looks a payment up by id within a school
    async fn find_for_school(
        &self,
        school_id: SchoolId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, PortError>;

    /// Lists a school's payments, newest first
    async fn list_for_school(
        &self,
        school_id: SchoolId,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>, PortError>;

    /// Lists one student's payments within a school, newest first
    async fn list_for_student(
        &self,
        school_id: SchoolId,
        student_id: StudentId,
    ) -> Result<Vec<Payment>, PortError>;

    /// Aggregates a school's payments by status
    async fn stats_for_school(&self, school_id: SchoolId) -> Result<PaymentStats, PortError>;

    /// Applies a status change if the stored status still equals
    /// `transition.from`
    ///
    /// # Returns
    ///
    /// The updated payment when this call won, `None` when the stored
    /// status had already moved on
    async fn transition(
        &self,
        reference: &str,
        transition: &StatusTransition,
    ) -> Result<Option<Payment>, PortError>;
}

/// Persistence for settlement accounts
#[async_trait]
pub trait AccountStore: DomainPort + HealthCheckable {
    /// Lists a school's accounts, primary first, then newest first
    async fn list_for_school(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PortError>;

    /// Lists every account flagged primary for a school
    ///
    /// More than one entry means the stored data violates the
    /// single-primary rule.
    async fn primary_accounts(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PortError>;

    /// Stores a new account
    ///
    /// When `account.is_primary` is set, the previous primary is demoted in
    /// the same atomic operation.
    async fn insert(&self, account: NewBusinessAccount) -> Result<BusinessAccount, PortError>;

    /// Makes `account_id` the only primary account of the school
    ///
    /// # Returns
    ///
    /// The promoted account, or `None` if it does not belong to the school
    async fn set_primary(
        &self,
        school_id: SchoolId,
        account_id: BusinessAccountId,
    ) -> Result<Option<BusinessAccount>, PortError>;
}

/// In-memory implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn mock_health(adapter_id: &str) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("Mock adapter always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }

    /// In-memory school directory
    #[derive(Debug, Default)]
    pub struct InMemoryDirectory {
        schools: Arc<RwLock<HashMap<SchoolId, SchoolRef>>>,
        students: Arc<RwLock<HashMap<StudentId, StudentRef>>>,
        fee_types: Arc<RwLock<HashMap<FeeTypeId, FeeTypeRef>>>,
    }

    impl InMemoryDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_school(&self, school: SchoolRef) {
            self.schools.write().await.insert(school.id, school);
        }

        pub async fn add_student(&self, student: StudentRef) {
            self.students.write().await.insert(student.id, student);
        }

        pub async fn add_fee_type(&self, fee_type: FeeTypeRef) {
            self.fee_types.write().await.insert(fee_type.id, fee_type);
        }
    }

    impl DomainPort for InMemoryDirectory {}

    #[async_trait]
    impl SchoolDirectory for InMemoryDirectory {
        async fn get_school(&self, school_id: SchoolId) -> Result<SchoolRef, PortError> {
            self.schools
                .read()
                .await
                .get(&school_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("School", school_id))
        }

        async fn get_student(
            &self,
            school_id: SchoolId,
            student_id: StudentId,
        ) -> Result<StudentRef, PortError> {
            self.students
                .read()
                .await
                .get(&student_id)
                .filter(|s| s.school_id == school_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Student", student_id))
        }

        async fn get_fee_type(
            &self,
            school_id: SchoolId,
            fee_type_id: FeeTypeId,
        ) -> Result<FeeTypeRef, PortError> {
            self.fee_types
                .read()
                .await
                .get(&fee_type_id)
                .filter(|f| f.school_id == school_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("FeeType", fee_type_id))
        }
    }

    /// In-memory payment store
    ///
    /// All mutations happen under one write lock, which gives the same
    /// single-winner behavior as the conditional SQL update.
    #[derive(Debug, Default)]
    pub struct InMemoryPaymentStore {
        payments: Arc<RwLock<Vec<Payment>>>,
    }

    impl InMemoryPaymentStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.payments.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.payments.read().await.is_empty()
        }

        pub async fn all(&self) -> Vec<Payment> {
            self.payments.read().await.clone()
        }
    }

    fn newest_first(mut payments: Vec<Payment>) -> Vec<Payment> {
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        payments
    }

    impl DomainPort for InMemoryPaymentStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryPaymentStore {
        async fn health_check(&self) -> HealthCheckResult {
            mock_health("in-memory-payment-store")
        }
    }

    #[async_trait]
    impl PaymentStore for InMemoryPaymentStore {
        async fn insert(&self, new: NewPayment) -> Result<Payment, PortError> {
            let mut payments = self.payments.write().await;
            if payments.iter().any(|p| p.reference == new.reference) {
                return Err(PortError::conflict(format!(
                    "payment reference {} already exists",
                    new.reference
                )));
            }
            let now = Utc::now();
            let payment = Payment {
                id: PaymentId::new(payments.len() as i64 + 1),
                school_id: new.school_id,
                student_id: new.student_id,
                fee_type_id: new.fee_type_id,
                session_id: new.session_id,
                reference: new.reference,
                amount: new.amount,
                currency: new.currency,
                payment_method: new.payment_method,
                status: new.status,
                gateway_reference: None,
                paid_at: new.paid_at,
                refunded_at: None,
                created_at: now,
                updated_at: now,
            };
            payments.push(payment.clone());
            Ok(payment)
        }

        async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, PortError> {
            Ok(self
                .payments
                .read()
                .await
                .iter()
                .find(|p| p.reference == reference)
                .cloned())
        }

        async fn find_for_school(
            &self,
            school_id: SchoolId,
            payment_id: PaymentId,
        ) -> Result<Option<Payment>, PortError> {
            Ok(self
                .payments
                .read()
                .await
                .iter()
                .find(|p| p.id == payment_id && p.school_id == school_id)
                .cloned())
        }

        async fn list_for_school(
            &self,
            school_id: SchoolId,
            status: Option<PaymentStatus>,
        ) -> Result<Vec<Payment>, PortError> {
            let payments = self.payments.read().await;
            Ok(newest_first(
                payments
                    .iter()
                    .filter(|p| p.school_id == school_id)
                    .filter(|p| status.map_or(true, |s| p.status == s))
                    .cloned()
                    .collect(),
            ))
        }

        async fn list_for_student(
            &self,
            school_id: SchoolId,
            student_id: StudentId,
        ) -> Result<Vec<Payment>, PortError> {
            let payments = self.payments.read().await;
            Ok(newest_first(
                payments
                    .iter()
                    .filter(|p| p.school_id == school_id && p.student_id == student_id)
                    .cloned()
                    .collect(),
            ))
        }

        async fn stats_for_school(&self, school_id: SchoolId) -> Result<PaymentStats, PortError> {
            let payments = self.payments.read().await;
            Ok(PaymentStats::from_payments(
                payments.iter().filter(|p| p.school_id == school_id),
            ))
        }

        async fn transition(
            &self,
            reference: &str,
            transition: &StatusTransition,
        ) -> Result<Option<Payment>, PortError> {
            let mut payments = self.payments.write().await;
            let Some(payment) = payments
                .iter_mut()
                .find(|p| p.reference == reference && p.status == transition.from)
            else {
                return Ok(None);
            };
            transition.apply(payment, Utc::now());
            Ok(Some(payment.clone()))
        }
    }

    /// In-memory settlement account store
    #[derive(Debug, Default)]
    pub struct InMemoryAccountStore {
        accounts: Arc<RwLock<Vec<BusinessAccount>>>,
    }

    impl InMemoryAccountStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds an account as-is, bypassing the primary demotion
        pub async fn seed(&self, account: BusinessAccount) {
            self.accounts.write().await.push(account);
        }
    }

    impl DomainPort for InMemoryAccountStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryAccountStore {
        async fn health_check(&self) -> HealthCheckResult {
            mock_health("in-memory-account-store")
        }
    }

    #[async_trait]
    impl AccountStore for InMemoryAccountStore {
        async fn list_for_school(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PortError> {
            let mut accounts: Vec<_> = self
                .accounts
                .read()
                .await
                .iter()
                .filter(|a| a.school_id == school_id)
                .cloned()
                .collect();
            accounts.sort_by(|a, b| {
                b.is_primary
                    .cmp(&a.is_primary)
                    .then(b.created_at.cmp(&a.created_at))
                    .then(b.id.cmp(&a.id))
            });
            Ok(accounts)
        }

        async fn primary_accounts(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PortError> {
            Ok(self
                .accounts
                .read()
                .await
                .iter()
                .filter(|a| a.school_id == school_id && a.is_primary)
                .cloned()
                .collect())
        }

        async fn insert(&self, new: NewBusinessAccount) -> Result<BusinessAccount, PortError> {
            let mut accounts = self.accounts.write().await;
            let now = Utc::now();
            if new.is_primary {
                for account in accounts.iter_mut().filter(|a| a.school_id == new.school_id) {
                    account.is_primary = false;
                    account.updated_at = now;
                }
            }
            let next_id = accounts.iter().map(|a| a.id.value()).max().unwrap_or(0) + 1;
            let account = BusinessAccount {
                id: BusinessAccountId::new(next_id),
                school_id: new.school_id,
                bank_name: new.bank_name,
                bank_code: new.bank_code,
                account_number: new.account_number,
                account_name: new.account_name,
                is_primary: new.is_primary,
                is_verified: new.is_verified,
                subaccount_code: new.subaccount_code,
                created_at: now,
                updated_at: now,
            };
            accounts.push(account.clone());
            Ok(account)
        }

        async fn set_primary(
            &self,
            school_id: SchoolId,
            account_id: BusinessAccountId,
        ) -> Result<Option<BusinessAccount>, PortError> {
            let mut accounts = self.accounts.write().await;
            if !accounts
                .iter()
                .any(|a| a.id == account_id && a.school_id == school_id)
            {
                return Ok(None);
            }
            let now = Utc::now();
            let mut promoted = None;
            for account in accounts.iter_mut().filter(|a| a.school_id == school_id) {
                account.is_primary = account.id == account_id;
                account.updated_at = now;
                if account.is_primary {
                    promoted = Some(account.clone());
                }
            }
            Ok(promoted)
        }
    }
}

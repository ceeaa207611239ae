//! Pre-built Test Fixtures
//!
//! Well-known ids and a [`MockPorts`] world seeded with two schools. School
//! [`SCHOOL_ID`] can take payments: it has student [`STUDENT_ID`], fee type
//! [`FEE_TYPE_ID`] of 5000 NGN and a verified primary account routed to
//! [`SUBACCOUNT_CODE`]. School [`OTHER_SCHOOL_ID`] has its own student and
//! fee type but no settlement account.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Currency, FeeTypeId, SchoolId, StudentId};
use domain_payments::{
    BusinessAccount, FeeTypeRef, InMemoryAccountStore, InMemoryDirectory, InMemoryPaymentStore,
    RecordingGateway, SchoolRef, StudentRef,
};

use crate::builders::{BusinessAccountBuilder, FeeTypeBuilder};

pub const SCHOOL_ID: SchoolId = SchoolId::new(1);
pub const OTHER_SCHOOL_ID: SchoolId = SchoolId::new(2);
pub const INACTIVE_SCHOOL_ID: SchoolId = SchoolId::new(3);

pub const STUDENT_ID: StudentId = StudentId::new(42);
pub const OTHER_STUDENT_ID: StudentId = StudentId::new(43);

pub const FEE_TYPE_ID: FeeTypeId = FeeTypeId::new(7);
pub const OTHER_FEE_TYPE_ID: FeeTypeId = FeeTypeId::new(8);

pub const SUBACCOUNT_CODE: &str = "SUB123";
pub const PAYER_EMAIL: &str = "x@y.com";

/// The bank account the gateway stub can resolve for onboarding tests
pub const RESOLVABLE_ACCOUNT: (&str, &str, &str) = ("0123456789", "044", "GREENFIELD ACADEMY LTD");

pub fn greenfield() -> SchoolRef {
    SchoolRef {
        id: SCHOOL_ID,
        name: "Greenfield Academy".to_string(),
        is_active: true,
    }
}

pub fn hilltop() -> SchoolRef {
    SchoolRef {
        id: OTHER_SCHOOL_ID,
        name: "Hilltop College".to_string(),
        is_active: true,
    }
}

pub fn tuition_fee() -> FeeTypeRef {
    FeeTypeBuilder::new(FEE_TYPE_ID, SCHOOL_ID)
        .with_name("First Term Tuition")
        .with_amount(dec!(5000))
        .build()
}

pub fn primary_account() -> BusinessAccount {
    BusinessAccountBuilder::new(SCHOOL_ID)
        .primary()
        .with_subaccount_code(SUBACCOUNT_CODE)
        .build()
}

/// In-memory implementations of every port the services need
#[derive(Clone)]
pub struct MockPorts {
    pub directory: Arc<InMemoryDirectory>,
    pub payments: Arc<InMemoryPaymentStore>,
    pub accounts: Arc<InMemoryAccountStore>,
    pub gateway: Arc<RecordingGateway>,
}

impl MockPorts {
    /// Empty ports
    pub fn empty() -> Self {
        Self {
            directory: Arc::new(InMemoryDirectory::new()),
            payments: Arc::new(InMemoryPaymentStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            gateway: Arc::new(RecordingGateway::new()),
        }
    }

    /// Ports seeded with the fixture schools described in the module docs
    pub async fn seeded() -> Self {
        let ports = Self::empty();

        ports.directory.add_school(greenfield()).await;
        ports.directory.add_school(hilltop()).await;
        ports
            .directory
            .add_school(SchoolRef {
                id: INACTIVE_SCHOOL_ID,
                name: "Closed School".to_string(),
                is_active: false,
            })
            .await;

        ports
            .directory
            .add_student(StudentRef {
                id: STUDENT_ID,
                school_id: SCHOOL_ID,
            })
            .await;
        ports
            .directory
            .add_student(StudentRef {
                id: OTHER_STUDENT_ID,
                school_id: OTHER_SCHOOL_ID,
            })
            .await;

        ports.directory.add_fee_type(tuition_fee()).await;
        ports
            .directory
            .add_fee_type(
                FeeTypeBuilder::new(OTHER_FEE_TYPE_ID, OTHER_SCHOOL_ID)
                    .with_amount(dec!(12000))
                    .with_currency(Currency::NGN)
                    .build(),
            )
            .await;

        ports.accounts.seed(primary_account()).await;

        let (number, bank, name) = RESOLVABLE_ACCOUNT;
        ports.gateway.add_resolvable_account(number, bank, name).await;

        ports
    }
}

//! Test Data Builders
//!
//! Fluent builders for payments, settlement accounts and fee types with
//! sensible defaults, so tests only set the fields they care about.

use chrono::{DateTime, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BusinessAccountId, Currency, FeeTypeId, PaymentId, SchoolId, StudentId};
use domain_payments::{BusinessAccount, FeeTypeRef, NewPayment, Payment, PaymentMethod, PaymentStatus};

/// Random payer email address
pub fn fake_email() -> String {
    SafeEmail().fake()
}

/// Builder for Payment records
pub struct PaymentBuilder {
    id: PaymentId,
    school_id: SchoolId,
    student_id: StudentId,
    fee_type_id: FeeTypeId,
    reference: Option<String>,
    amount: Decimal,
    currency: Currency,
    payment_method: PaymentMethod,
    status: PaymentStatus,
    gateway_reference: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PaymentBuilder {
    pub fn new(school_id: SchoolId, student_id: StudentId) -> Self {
        Self {
            id: PaymentId::new(1),
            school_id,
            student_id,
            fee_type_id: FeeTypeId::new(1),
            reference: None,
            amount: dec!(5000),
            currency: Currency::NGN,
            payment_method: PaymentMethod::Paystack,
            status: PaymentStatus::Pending,
            gateway_reference: None,
            paid_at: None,
            refunded_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = PaymentId::new(id);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn manual(mut self) -> Self {
        self.payment_method = PaymentMethod::Manual;
        self
    }

    /// Marks the payment successful, stamping `paid_at` and a gateway reference
    pub fn successful(mut self) -> Self {
        self.status = PaymentStatus::Successful;
        self.paid_at = Some(self.created_at);
        if self.payment_method == PaymentMethod::Paystack {
            self.gateway_reference = Some(format!("TRX_{}", self.id.value()));
        }
        self
    }

    pub fn failed(mut self) -> Self {
        self.status = PaymentStatus::Failed;
        self.paid_at = None;
        self
    }

    /// Marks the payment refunded; `paid_at` moves to `refunded_at`
    pub fn refunded(self) -> Self {
        let mut payment = self.successful();
        payment.status = PaymentStatus::Refunded;
        payment.refunded_at = payment.paid_at.take();
        payment
    }

    fn reference(&self) -> String {
        self.reference.clone().unwrap_or_else(|| {
            let prefix = match self.payment_method {
                PaymentMethod::Paystack => "PAY",
                PaymentMethod::Manual => "MAN",
            };
            format!(
                "{}-{}-{}-{:08x}",
                prefix,
                self.created_at.timestamp_millis(),
                self.student_id.value(),
                self.id.value()
            )
        })
    }

    pub fn build(self) -> Payment {
        Payment {
            reference: self.reference(),
            id: self.id,
            school_id: self.school_id,
            student_id: self.student_id,
            fee_type_id: self.fee_type_id,
            session_id: None,
            amount: self.amount,
            currency: self.currency,
            payment_method: self.payment_method,
            status: self.status,
            gateway_reference: self.gateway_reference,
            paid_at: self.paid_at,
            refunded_at: self.refunded_at,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }

    /// Builds the insert form, for seeding a payment store
    ///
    /// Stores assign `refunded_at` on transition only, so seed refunded
    /// payments by inserting them successful and refunding.
    pub fn build_new(self) -> NewPayment {
        NewPayment {
            reference: self.reference(),
            school_id: self.school_id,
            student_id: self.student_id,
            fee_type_id: self.fee_type_id,
            session_id: None,
            amount: self.amount,
            currency: self.currency,
            payment_method: self.payment_method,
            status: self.status,
            paid_at: self.paid_at,
        }
    }
}

/// Builder for settlement accounts
pub struct BusinessAccountBuilder {
    id: BusinessAccountId,
    school_id: SchoolId,
    bank_name: String,
    bank_code: String,
    account_number: String,
    account_name: String,
    is_primary: bool,
    is_verified: bool,
    subaccount_code: Option<String>,
}

impl BusinessAccountBuilder {
    /// A verified, non-primary account with a random holder name
    pub fn new(school_id: SchoolId) -> Self {
        let holder: String = CompanyName().fake();
        Self {
            id: BusinessAccountId::new(1),
            school_id,
            bank_name: "Access Bank".to_string(),
            bank_code: "044".to_string(),
            account_number: "0123456789".to_string(),
            account_name: holder.to_uppercase(),
            is_primary: false,
            is_verified: true,
            subaccount_code: Some("ACCT_test".to_string()),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = BusinessAccountId::new(id);
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn unverified(mut self) -> Self {
        self.is_verified = false;
        self
    }

    pub fn with_subaccount_code(mut self, code: impl Into<String>) -> Self {
        self.subaccount_code = Some(code.into());
        self
    }

    pub fn without_subaccount(mut self) -> Self {
        self.subaccount_code = None;
        self
    }

    pub fn build(self) -> BusinessAccount {
        let now = Utc::now();
        BusinessAccount {
            id: self.id,
            school_id: self.school_id,
            bank_name: self.bank_name,
            bank_code: self.bank_code,
            account_number: self.account_number,
            account_name: self.account_name,
            is_primary: self.is_primary,
            is_verified: self.is_verified,
            subaccount_code: self.subaccount_code,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Builder for fee types
pub struct FeeTypeBuilder {
    id: FeeTypeId,
    school_id: SchoolId,
    name: String,
    amount: Decimal,
    currency: Currency,
}

impl FeeTypeBuilder {
    pub fn new(id: FeeTypeId, school_id: SchoolId) -> Self {
        Self {
            id,
            school_id,
            name: "Tuition".to_string(),
            amount: dec!(5000),
            currency: Currency::NGN,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn build(self) -> FeeTypeRef {
        FeeTypeRef {
            id: self.id,
            school_id: self.school_id,
            name: self.name,
            amount: self.amount,
            currency: self.currency,
            session_id: None,
            is_active: true,
        }
    }
}

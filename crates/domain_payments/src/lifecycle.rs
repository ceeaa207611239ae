//! Payment Lifecycle Manager
//!
//! Orchestrates the fee calculator, settlement resolver and gateway:
//!
//! ```text
//! initialize:  validate -> quote -> resolve settlement -> reference
//!              -> persist pending -> gateway initialize
//! verify:      load -> short-circuit settled -> gateway verify
//!              -> guarded pending -> successful | failed
//! ```
//!
//! Steps run strictly in this order. A failure after the pending record is
//! stored leaves it pending; it is reconciled later by verification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use core_kernel::{Currency, FeeTypeId, Money, PaymentId, SchoolId, StudentId};

use crate::error::PaymentError;
use crate::fees::{compute_transaction_fee, FeeBreakdown};
use crate::gateway::{InitializeRequest, PaymentGateway, TransactionStatus};
use crate::payment::{
    NewPayment, Payment, PaymentMethod, PaymentStats, PaymentStatus, StatusTransition,
};
use crate::ports::{AccountStore, FeeTypeRef, PaymentStore, SchoolDirectory, SchoolRef};
use crate::reference;
use crate::settlement::SettlementResolver;

/// Input of a gateway checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializePaymentRequest {
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub fee_type_id: FeeTypeId,
    pub email: String,
}

/// What the payer needs to complete a checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedPayment {
    pub payment_id: PaymentId,
    pub reference: String,
    /// Base fee owed to the school
    pub fee_amount: Decimal,
    pub transaction_fee: Decimal,
    pub total_amount: Decimal,
    pub currency: Currency,
    pub authorization_url: String,
    pub access_code: String,
}

/// How a verification call concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// This call moved the payment to successful
    Verified,
    /// This call moved the payment to failed
    Failed,
    /// The gateway has not settled the charge yet
    StillPending,
    /// The payment was already settled; nothing changed
    AlreadySettled,
}

/// Result of [`PaymentService::verify_payment`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub outcome: VerificationOutcome,
    pub message: String,
    pub payment: Payment,
}

impl VerificationResult {
    fn new(outcome: VerificationOutcome, payment: Payment) -> Self {
        let message = match (outcome, payment.status) {
            (VerificationOutcome::Verified, _) => "Payment verified successfully",
            (VerificationOutcome::Failed, _) => "Payment verification failed",
            (VerificationOutcome::StillPending, _) => "Payment is still being processed",
            (VerificationOutcome::AlreadySettled, PaymentStatus::Successful) => "Payment already verified",
            (VerificationOutcome::AlreadySettled, PaymentStatus::Failed) => "Payment already marked as failed",
            (VerificationOutcome::AlreadySettled, PaymentStatus::Refunded) => "Payment has been refunded",
            (VerificationOutcome::AlreadySettled, PaymentStatus::Pending) => "Payment is still being processed",
        };
        Self {
            outcome,
            message: message.to_string(),
            payment,
        }
    }
}

/// Input of an offline payment recorded by staff
#[derive(Debug, Clone, PartialEq)]
pub struct ManualPaymentRequest {
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub fee_type_id: FeeTypeId,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub reference: Option<String>,
}

/// Fee preview for a fee type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub school_id: SchoolId,
    pub fee_type_id: FeeTypeId,
    pub fee_type_name: String,
    #[serde(flatten)]
    pub breakdown: FeeBreakdown,
}

/// Where a new payment's reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceSource {
    Generated,
    Supplied,
}

/// Application service for the payment lifecycle
#[derive(Clone)]
pub struct PaymentService {
    directory: Arc<dyn SchoolDirectory>,
    payments: Arc<dyn PaymentStore>,
    settlement: Arc<SettlementResolver>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(
        directory: Arc<dyn SchoolDirectory>,
        payments: Arc<dyn PaymentStore>,
        accounts: Arc<dyn AccountStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            directory,
            payments,
            settlement: Arc::new(SettlementResolver::new(accounts)),
            gateway,
        }
    }

    /// Starts a gateway checkout for a student's fee
    ///
    /// # Returns
    ///
    /// The pending payment's reference, the fee breakdown and the checkout
    /// link
    ///
    /// # Errors
    ///
    /// Lookups, amount validation and settlement resolution fail before
    /// anything is stored. Gateway errors are returned after the pending
    /// payment is stored and leave it pending.
    #[instrument(
        skip(self, request),
        fields(
            school_id = %request.school_id,
            student_id = %request.student_id,
            fee_type_id = %request.fee_type_id,
            reference = tracing::field::Empty
        )
    )]
    pub async fn initialize_payment(
        &self,
        request: InitializePaymentRequest,
    ) -> Result<InitializedPayment, PaymentError> {
        let school = self.active_school(request.school_id).await?;
        self.directory
            .get_student(school.id, request.student_id)
            .await?;
        let fee_type = self.active_fee_type(school.id, request.fee_type_id).await?;

        let breakdown = compute_transaction_fee(Money::new(fee_type.amount, fee_type.currency))?;
        let amount_minor = breakdown.total_minor_units()?;

        let target = self.settlement.resolve_primary_account(school.id).await?;

        let reference = reference::generate(request.student_id, Utc::now());
        tracing::Span::current().record("reference", reference.as_str());

        let payment = self
            .store_new(ReferenceSource::Generated, NewPayment {
                school_id: school.id,
                student_id: request.student_id,
                fee_type_id: fee_type.id,
                session_id: fee_type.session_id,
                reference: reference.clone(),
                amount: breakdown.base_amount,
                currency: breakdown.currency,
                payment_method: PaymentMethod::Paystack,
                status: PaymentStatus::Pending,
                paid_at: None,
            })
            .await?;

        let checkout = self
            .gateway
            .initialize(InitializeRequest {
                email: request.email,
                amount_minor,
                reference: reference.clone(),
                subaccount_code: Some(target.subaccount_code),
                metadata: json!({
                    "paymentId": payment.id,
                    "schoolId": school.id,
                    "studentId": request.student_id,
                    "feeTypeId": fee_type.id,
                    "feeAmount": breakdown.base_amount,
                    "transactionFee": breakdown.transaction_fee,
                }),
            })
            .await
            .map_err(|err| {
                warn!(error = %err, "gateway initialization failed, payment left pending");
                PaymentError::from(err)
            })?;

        info!(total_minor = amount_minor, "payment initialized");

        Ok(InitializedPayment {
            payment_id: payment.id,
            reference,
            fee_amount: breakdown.base_amount,
            transaction_fee: breakdown.transaction_fee,
            total_amount: breakdown.total_payable,
            currency: breakdown.currency,
            authorization_url: checkout.authorization_url,
            access_code: checkout.access_code,
        })
    }

    /// Reconciles a payment with the gateway's record
    ///
    /// Safe to call repeatedly and concurrently: a settled payment is
    /// returned as-is without contacting the gateway, and only one caller
    /// can move a pending payment to its final status.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn verify_payment(&self, reference: &str) -> Result<VerificationResult, PaymentError> {
        let payment = self
            .payments
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| PaymentError::not_found("Payment", reference))?;

        if payment.status.is_settled() {
            return Ok(VerificationResult::new(VerificationOutcome::AlreadySettled, payment));
        }

        let verification = self.gateway.verify(reference).await.map_err(|err| {
            warn!(error = %err, "gateway verification failed, payment left pending");
            PaymentError::from(err)
        })?;

        let (transition, outcome) = match verification.status {
            TransactionStatus::Success => {
                self.check_charged_amount(&payment, verification.amount_minor)?;
                (
                    StatusTransition::succeed(verification.gateway_reference, Utc::now()),
                    VerificationOutcome::Verified,
                )
            }
            TransactionStatus::Failed(ref status) => {
                info!(gateway_status = %status, "gateway reports charge not completed");
                (StatusTransition::fail(), VerificationOutcome::Failed)
            }
            TransactionStatus::InProgress(ref status) => {
                info!(gateway_status = %status, "charge still in progress");
                return Ok(VerificationResult::new(VerificationOutcome::StillPending, payment));
            }
        };

        match self.payments.transition(reference, &transition).await? {
            Some(updated) => {
                info!(status = %updated.status, "payment reconciled");
                Ok(VerificationResult::new(outcome, updated))
            }
            None => {
                // another verifier settled it first
                let current = self
                    .payments
                    .find_by_reference(reference)
                    .await?
                    .ok_or_else(|| PaymentError::not_found("Payment", reference))?;
                Ok(VerificationResult::new(VerificationOutcome::AlreadySettled, current))
            }
        }
    }

    /// Lists a school's payments, newest first
    #[instrument(skip(self), fields(school_id = %school_id))]
    pub async fn list_payments(
        &self,
        school_id: SchoolId,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.payments.list_for_school(school_id, status).await?)
    }

    /// Retrieves one payment of a school
    #[instrument(skip(self), fields(school_id = %school_id, payment_id = %payment_id))]
    pub async fn get_payment(
        &self,
        school_id: SchoolId,
        payment_id: PaymentId,
    ) -> Result<Payment, PaymentError> {
        self.payments
            .find_for_school(school_id, payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found("Payment", payment_id))
    }

    /// Lists a student's payments within a school
    #[instrument(skip(self), fields(school_id = %school_id, student_id = %student_id))]
    pub async fn student_payments(
        &self,
        school_id: SchoolId,
        student_id: StudentId,
    ) -> Result<Vec<Payment>, PaymentError> {
        self.directory.get_student(school_id, student_id).await?;
        Ok(self.payments.list_for_student(school_id, student_id).await?)
    }

    /// Aggregates a school's payments by status
    pub async fn payment_stats(&self, school_id: SchoolId) -> Result<PaymentStats, PaymentError> {
        Ok(self.payments.stats_for_school(school_id).await?)
    }

    /// Records a payment made outside the gateway
    #[instrument(
        skip(self, request),
        fields(school_id = %request.school_id, student_id = %request.student_id)
    )]
    pub async fn record_manual_payment(
        &self,
        request: ManualPaymentRequest,
    ) -> Result<Payment, PaymentError> {
        let school = self.active_school(request.school_id).await?;
        self.directory
            .get_student(school.id, request.student_id)
            .await?;
        let fee_type = self
            .directory
            .get_fee_type(school.id, request.fee_type_id)
            .await?;

        let amount = Money::new(request.amount, fee_type.currency);
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount(format!(
                "manual payment amount must be greater than zero, got {}",
                request.amount
            )));
        }
        if !amount.fits_minor_units() {
            return Err(PaymentError::InvalidAmount(format!(
                "manual payment amount {} has more than {} decimal places",
                request.amount,
                amount.currency().decimal_places()
            )));
        }

        let now = Utc::now();
        let (source, reference) = match request.reference.filter(|r| !r.trim().is_empty()) {
            Some(supplied) => (ReferenceSource::Supplied, supplied),
            None => (
                ReferenceSource::Generated,
                reference::generate_manual(request.student_id, now),
            ),
        };

        let payment = self
            .store_new(source, NewPayment {
                school_id: school.id,
                student_id: request.student_id,
                fee_type_id: fee_type.id,
                session_id: fee_type.session_id,
                reference,
                amount: amount.amount(),
                currency: amount.currency(),
                payment_method: PaymentMethod::Manual,
                status: PaymentStatus::Successful,
                paid_at: Some(request.paid_at.unwrap_or(now)),
            })
            .await?;

        info!(reference = %payment.reference, "manual payment recorded");
        Ok(payment)
    }

    /// Marks a successful payment as refunded
    #[instrument(skip(self), fields(school_id = %school_id, payment_id = %payment_id))]
    pub async fn refund_payment(
        &self,
        school_id: SchoolId,
        payment_id: PaymentId,
    ) -> Result<Payment, PaymentError> {
        let payment = self.get_payment(school_id, payment_id).await?;
        let transition = StatusTransition::refund(Utc::now());
        transition.ensure_from(payment.status)?;

        match self.payments.transition(&payment.reference, &transition).await? {
            Some(updated) => {
                info!(reference = %updated.reference, "payment refunded");
                Ok(updated)
            }
            None => {
                // status moved between the read and the guarded update
                let current = self.get_payment(school_id, payment_id).await?;
                Err(PaymentError::InvalidStatusTransition {
                    from: current.status.to_string(),
                    to: transition.to.to_string(),
                })
            }
        }
    }

    /// Previews the charge for a fee type
    ///
    /// Uses the same computation as [`initialize_payment`](Self::initialize_payment).
    #[instrument(skip(self), fields(school_id = %school_id, fee_type_id = %fee_type_id))]
    pub async fn quote_fee(
        &self,
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
    ) -> Result<FeeQuote, PaymentError> {
        let school = self.active_school(school_id).await?;
        let fee_type = self.active_fee_type(school.id, fee_type_id).await?;
        let breakdown = compute_transaction_fee(Money::new(fee_type.amount, fee_type.currency))?;

        Ok(FeeQuote {
            school_id: school.id,
            fee_type_id: fee_type.id,
            fee_type_name: fee_type.name,
            breakdown,
        })
    }

    async fn active_school(&self, school_id: SchoolId) -> Result<SchoolRef, PaymentError> {
        let school = self.directory.get_school(school_id).await?;
        if !school.is_active {
            return Err(PaymentError::not_found("School", school_id));
        }
        Ok(school)
    }

    async fn active_fee_type(
        &self,
        school_id: SchoolId,
        fee_type_id: FeeTypeId,
    ) -> Result<FeeTypeRef, PaymentError> {
        let fee_type = self.directory.get_fee_type(school_id, fee_type_id).await?;
        if !fee_type.is_active {
            return Err(PaymentError::not_found("Fee type", fee_type_id));
        }
        Ok(fee_type)
    }

    async fn store_new(
        &self,
        source: ReferenceSource,
        payment: NewPayment,
    ) -> Result<Payment, PaymentError> {
        let reference = payment.reference.clone();
        self.payments.insert(payment).await.map_err(|err| {
            if !err.is_conflict() {
                return PaymentError::from(err);
            }
            match source {
                ReferenceSource::Generated => {
                    error!(reference = %reference, "payment reference collision");
                    PaymentError::DuplicateReference(reference)
                }
                ReferenceSource::Supplied => {
                    warn!(reference = %reference, "supplied payment reference already in use");
                    PaymentError::ReferenceInUse(reference)
                }
            }
        })
    }

    fn check_charged_amount(
        &self,
        payment: &Payment,
        charged_minor: Option<i64>,
    ) -> Result<(), PaymentError> {
        let Some(charged) = charged_minor else {
            return Ok(());
        };
        let expected = compute_transaction_fee(payment.money())?.total_minor_units()?;
        if charged != expected {
            error!(expected, charged, "gateway charged a different amount");
            return Err(PaymentError::VerificationMismatch {
                reference: payment.reference.clone(),
                expected_minor: expected,
                charged_minor: charged,
            });
        }
        Ok(())
    }
}

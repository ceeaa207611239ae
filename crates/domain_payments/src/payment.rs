//! Payment records and their status machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, FeeTypeId, Money, PaymentId, SchoolId, SessionId, StudentId};

use crate::error::PaymentError;

/// How the payment was collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card or transfer through the Paystack checkout
    Paystack,
    /// Recorded by school staff for an offline payment
    Manual,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Paystack => "paystack",
            PaymentMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paystack" => Ok(PaymentMethod::Paystack),
            "manual" => Ok(PaymentMethod::Manual),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Payment status
///
/// `Pending` moves to `Successful` or `Failed` once. `Successful` may later be
/// refunded. Nothing moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Successful => "successful",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Whether `self -> target` is an allowed move
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (*self, target),
            (Pending, Successful) |
            (Pending, Failed) |
            (Successful, Refunded)
        )
    }

    /// A settled payment is never sent back to the gateway for verification
    pub fn is_settled(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Only a successful payment carries `paid_at`
    pub fn requires_paid_at(&self) -> bool {
        matches!(self, PaymentStatus::Successful)
    }

    /// Only a refunded payment carries `refunded_at`
    pub fn requires_refunded_at(&self) -> bool {
        matches!(self, PaymentStatus::Refunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "successful" => Ok(PaymentStatus::Successful),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// One attempted fee payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub fee_type_id: FeeTypeId,
    pub session_id: Option<SessionId>,
    /// Platform reference, unique across all schools
    pub reference: String,
    /// Base fee owed to the school, without the gateway surcharge
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway's own transaction reference, set on successful verification
    pub gateway_reference: Option<String>,
    /// Set while the payment is successful
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }

    /// Checks the stored state against the status invariants
    pub fn is_consistent(&self) -> bool {
        self.status.requires_paid_at() == self.paid_at.is_some()
            && self.status.requires_refunded_at() == self.refunded_at.is_some()
    }
}

/// A payment about to be stored; ids and timestamps are assigned by storage
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub fee_type_id: FeeTypeId,
    pub session_id: Option<SessionId>,
    pub reference: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// A guarded status change: applied only if the stored status is still `from`
///
/// The transition carries the complete timestamp state of the target status,
/// so applying it clears `paid_at` on refund.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub gateway_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl StatusTransition {
    pub fn succeed(gateway_reference: Option<String>, paid_at: DateTime<Utc>) -> Self {
        Self {
            from: PaymentStatus::Pending,
            to: PaymentStatus::Successful,
            gateway_reference,
            paid_at: Some(paid_at),
            refunded_at: None,
        }
    }

    pub fn fail() -> Self {
        Self {
            from: PaymentStatus::Pending,
            to: PaymentStatus::Failed,
            gateway_reference: None,
            paid_at: None,
            refunded_at: None,
        }
    }

    pub fn refund(refunded_at: DateTime<Utc>) -> Self {
        Self {
            from: PaymentStatus::Successful,
            to: PaymentStatus::Refunded,
            gateway_reference: None,
            paid_at: None,
            refunded_at: Some(refunded_at),
        }
    }

    /// Rejects a payment whose current status is not this transition's source
    pub fn ensure_from(&self, current: PaymentStatus) -> Result<(), PaymentError> {
        if current != self.from {
            return Err(PaymentError::InvalidStatusTransition {
                from: current.to_string(),
                to: self.to.to_string(),
            });
        }
        Ok(())
    }

    /// Applies the transition to an in-memory payment
    ///
    /// `gateway_reference` is only overwritten when provided.
    pub fn apply(&self, payment: &mut Payment, now: DateTime<Utc>) {
        payment.status = self.to;
        if let Some(ref gateway_reference) = self.gateway_reference {
            payment.gateway_reference = Some(gateway_reference.clone());
        }
        payment.paid_at = self.paid_at;
        payment.refunded_at = self.refunded_at;
        payment.updated_at = now;
    }
}

/// Aggregate counters for a school's payments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_payments: u64,
    pub successful_count: u64,
    pub pending_count: u64,
    pub failed_count: u64,
    pub refunded_count: u64,
    /// Sum of successful payment amounts
    pub total_revenue: Decimal,
    /// Sum of all payment amounts regardless of status
    pub total_amount: Decimal,
}

impl PaymentStats {
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Self {
        payments.into_iter().fold(Self::default(), |mut stats, payment| {
            stats.total_payments += 1;
            stats.total_amount += payment.amount;
            match payment.status {
                PaymentStatus::Successful => {
                    stats.successful_count += 1;
                    stats.total_revenue += payment.amount;
                }
                PaymentStatus::Pending => stats.pending_count += 1,
                PaymentStatus::Failed => stats.failed_count += 1,
                PaymentStatus::Refunded => stats.refunded_count += 1,
            }
            stats
        })
    }
}

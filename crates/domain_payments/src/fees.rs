//! Transaction fee calculation
//!
//! The gateway surcharge is `1.5% of the base amount + 100`, capped at `2000`.
//! Fee previews and the amount actually charged both go through
//! [`compute_transaction_fee`]; nothing else in the crate does this
//! arithmetic.
//!
//! Values stay exact decimals. The single rounding step happens when the
//! total is converted to minor units for the gateway.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, Rate};

use crate::error::PaymentError;

/// Percentage component of the gateway surcharge
pub const GATEWAY_RATE: Rate = Rate::new(dec!(0.015));

/// Flat component of the gateway surcharge, in major units
pub const FLAT_CHARGE: Decimal = dec!(100);

/// Upper bound on the surcharge, in major units
pub const FEE_CAP: Decimal = dec!(2000);

/// Result of a fee computation: what the school is owed, what the payer is
/// surcharged, and what the payer is charged in total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub base_amount: Decimal,
    pub transaction_fee: Decimal,
    pub total_payable: Decimal,
    pub currency: Currency,
}

impl FeeBreakdown {
    pub fn base(&self) -> Money {
        Money::new(self.base_amount, self.currency)
    }

    pub fn total(&self) -> Money {
        Money::new(self.total_payable, self.currency)
    }

    /// Total payable in gateway minor units (kobo for NGN)
    pub fn total_minor_units(&self) -> Result<i64, PaymentError> {
        Ok(self.total().to_minor_units()?)
    }
}

/// Computes the transaction fee and total payable for a base amount
///
/// # Arguments
///
/// * `base` - The fee amount owed to the school
///
/// # Returns
///
/// The breakdown, or `PaymentError::InvalidAmount` if `base` is not
/// strictly positive
pub fn compute_transaction_fee(base: Money) -> Result<FeeBreakdown, PaymentError> {
    if !base.is_positive() {
        return Err(PaymentError::InvalidAmount(format!(
            "base amount must be greater than zero, got {}",
            base.amount()
        )));
    }

    let currency = base.currency();
    let uncapped = GATEWAY_RATE
        .apply(&base)?
        .checked_add(&Money::new(FLAT_CHARGE, currency))?;
    let fee = uncapped.min(Money::new(FEE_CAP, currency))?;
    let total = base.checked_add(&fee)?;

    Ok(FeeBreakdown {
        base_amount: base.amount(),
        transaction_fee: fee.amount(),
        total_payable: total.amount(),
        currency,
    })
}

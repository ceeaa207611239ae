//! Property-Based Test Generators
//!
//! Proptest strategies for fee amounts, currencies and payment statuses.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_payments::PaymentStatus;

/// Strategy for currencies the gateway settles in
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::NGN),
        Just(Currency::GHS),
        Just(Currency::KES),
        Just(Currency::ZAR),
        Just(Currency::USD),
    ]
}

/// Positive fee amounts in major units with up to two decimal places
pub fn base_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Amounts with up to four decimal places, for rounding edge cases
pub fn fractional_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64, 0u32..=4u32).prop_map(|(m, scale)| Decimal::new(m, scale))
}

/// Zero or negative amounts, which every fee operation must refuse
pub fn non_positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..=0i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Positive money in any supported currency
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (base_amount_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::new(amount, currency))
}

pub fn payment_status_strategy() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Successful),
        Just(PaymentStatus::Failed),
        Just(PaymentStatus::Refunded),
    ]
}

/// Student ids as they appear in payment references
pub fn student_id_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

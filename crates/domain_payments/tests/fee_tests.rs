//! Tests for the transaction fee formula

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money};
use domain_payments::fees::{compute_transaction_fee, FEE_CAP, FLAT_CHARGE};
use domain_payments::PaymentError;
use test_utils::{
    assert_fee_breakdown, base_amount_strategy, currency_strategy, fractional_amount_strategy,
    non_positive_amount_strategy, positive_money_strategy,
};

fn ngn(amount: Decimal) -> Money {
    Money::new(amount, Currency::NGN)
}

// ============================================================================
// Known values
// ============================================================================

mod known_values {
    use super::*;

    #[test]
    fn test_school_fee_of_5000() {
        let breakdown = compute_transaction_fee(ngn(dec!(5000))).unwrap();
        assert_eq!(breakdown.base_amount, dec!(5000));
        assert_eq!(breakdown.transaction_fee, dec!(175));
        assert_eq!(breakdown.total_payable, dec!(5175));
        assert_eq!(breakdown.total_minor_units().unwrap(), 517500);
    }

    #[test]
    fn test_fee_of_1000_is_uncapped() {
        let breakdown = compute_transaction_fee(ngn(dec!(1000))).unwrap();
        assert_eq!(breakdown.transaction_fee, dec!(115));
    }

    #[test]
    fn test_fee_of_100000_is_capped() {
        let breakdown = compute_transaction_fee(ngn(dec!(100000))).unwrap();
        assert_eq!(breakdown.transaction_fee, dec!(2000));
        assert_eq!(breakdown.total_payable, dec!(102000));
    }

    #[test]
    fn test_smallest_amount() {
        let breakdown = compute_transaction_fee(ngn(dec!(0.01))).unwrap();
        assert_eq!(breakdown.transaction_fee, dec!(100.00015));
        assert_eq!(breakdown.total_minor_units().unwrap(), 10001);
    }

    #[test]
    fn test_non_positive_rejected() {
        for amount in [dec!(0), dec!(-0.01), dec!(-5000)] {
            assert!(matches!(
                compute_transaction_fee(ngn(amount)),
                Err(PaymentError::InvalidAmount(_))
            ));
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

fn expected_fee(base: Decimal) -> Decimal {
    (base * dec!(0.015) + FLAT_CHARGE).min(FEE_CAP)
}

proptest! {
    #[test]
    fn fee_follows_formula(amount in base_amount_strategy()) {
        let breakdown = compute_transaction_fee(ngn(amount)).unwrap();
        assert_fee_breakdown(&breakdown, expected_fee(amount));
    }

    #[test]
    fn fee_is_the_same_in_every_currency(base in positive_money_strategy()) {
        let breakdown = compute_transaction_fee(base).unwrap();
        prop_assert_eq!(breakdown.currency, base.currency());
        assert_fee_breakdown(&breakdown, expected_fee(base.amount()));
    }

    #[test]
    fn fee_is_bounded(amount in base_amount_strategy(), currency in currency_strategy()) {
        let breakdown = compute_transaction_fee(Money::new(amount, currency)).unwrap();
        prop_assert!(breakdown.transaction_fee > FLAT_CHARGE);
        prop_assert!(breakdown.transaction_fee <= FEE_CAP);
    }

    #[test]
    fn sub_minor_amounts_round_once_at_the_boundary(amount in fractional_amount_strategy()) {
        let breakdown = compute_transaction_fee(ngn(amount)).unwrap();
        assert_fee_breakdown(&breakdown, expected_fee(amount));

        let charged = breakdown.total_minor_units().unwrap();
        let exact = breakdown.total_payable * dec!(100);
        prop_assert!((Decimal::from(charged) - exact).abs() <= dec!(0.5));
    }

    #[test]
    fn repeated_computation_is_identical(amount in base_amount_strategy()) {
        let quoted = compute_transaction_fee(ngn(amount)).unwrap();
        let charged = compute_transaction_fee(ngn(amount)).unwrap();
        prop_assert_eq!(quoted.total_minor_units().unwrap(), charged.total_minor_units().unwrap());
        prop_assert_eq!(quoted, charged);
    }

    #[test]
    fn non_positive_amounts_are_refused(amount in non_positive_amount_strategy()) {
        prop_assert!(matches!(
            compute_transaction_fee(ngn(amount)),
            Err(PaymentError::InvalidAmount(_))
        ));
    }
}

//! Unit tests for the Money module
//!
//! Covers creation, minor-unit conversion, arithmetic, rates and currency
//! handling.

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_keeps_sub_minor_precision() {
        let m = Money::new(dec!(5175.0075), Currency::NGN);
        assert_eq!(m.amount(), dec!(5175.0075));
        assert!(!m.fits_minor_units());
    }

    #[test]
    fn test_from_minor_converts_kobo() {
        let m = Money::from_minor(10050, Currency::NGN);
        assert_eq!(m.amount(), dec!(100.50));
        assert!(m.fits_minor_units());
    }

    #[test]
    fn test_zero_and_negative_are_not_positive() {
        assert!(!Money::new(dec!(0), Currency::GHS).is_positive());
        assert!(!Money::new(dec!(-1), Currency::NGN).is_positive());
        assert!(Money::new(dec!(0.01), Currency::NGN).is_positive());
    }
}

mod minor_units {
    use super::*;

    #[test]
    fn test_whole_amount() {
        let m = Money::new(dec!(200000), Currency::NGN);
        assert_eq!(m.to_minor_units(), Ok(20_000_000));
    }

    #[test]
    fn test_fractional_fee_rounds_once() {
        // 1.5% of 333.33 plus 100 = 104.99995
        let m = Money::new(dec!(437.32995), Currency::NGN);
        assert_eq!(m.to_minor_units(), Ok(43733));
    }

    #[test]
    fn test_negative_midpoint_rounds_away_from_zero() {
        let m = Money::new(dec!(-0.005), Currency::NGN);
        assert_eq!(m.to_minor_units(), Ok(-1));
    }

    #[test]
    fn test_overflow_is_reported() {
        let m = Money::new(rust_decimal::Decimal::MAX, Currency::NGN);
        assert_eq!(m.to_minor_units(), Err(MoneyError::Overflow));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(5000), Currency::NGN);
        let b = Money::new(dec!(175), Currency::NGN);
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(5175));
    }

    #[test]
    fn test_checked_add_mismatch() {
        let a = Money::new(dec!(5000), Currency::NGN);
        let b = Money::new(dec!(175), Currency::KES);
        assert_eq!(
            a.checked_add(&b),
            Err(MoneyError::CurrencyMismatch("NGN".into(), "KES".into()))
        );
    }

    #[test]
    fn test_checked_add_overflow() {
        let a = Money::new(rust_decimal::Decimal::MAX, Currency::NGN);
        let b = Money::new(dec!(1), Currency::NGN);
        assert_eq!(a.checked_add(&b), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_min_mismatch() {
        let a = Money::new(dec!(1), Currency::NGN);
        let b = Money::new(dec!(1), Currency::ZAR);
        assert!(a.min(b).is_err());
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_rate_as_percentage() {
        let rate = Rate::new(dec!(0.015));
        assert_eq!(rate.as_percentage(), dec!(1.5));
        assert_eq!(rate.to_string(), "1.5%");
    }

    #[test]
    fn test_rate_apply_exact() {
        let rate = Rate::new(dec!(0.015));
        let amount = Money::new(dec!(333.33), Currency::NGN);
        assert_eq!(rate.apply(&amount).unwrap().amount(), dec!(4.99995));
    }
}

mod display {
    use super::*;

    #[test]
    fn test_naira_display() {
        let m = Money::new(dec!(5175), Currency::NGN);
        assert_eq!(m.to_string(), "₦5175.00");
    }

    #[test]
    fn test_currency_code_display() {
        assert_eq!(Currency::GHS.to_string(), "GHS");
        assert_eq!(Currency::default(), Currency::NGN);
    }

    #[test]
    fn test_currency_serde_uppercase() {
        let json = serde_json::to_string(&Currency::KES).unwrap();
        assert_eq!(json, "\"KES\"");
    }
}

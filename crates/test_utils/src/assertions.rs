//! Custom Test Assertions
//!
//! Assertion helpers that check payment invariants and print the offending
//! values on failure.

use rust_decimal::Decimal;

use domain_payments::{BusinessAccount, FeeBreakdown, Payment, PaymentStatus};

/// Asserts a fee breakdown adds up and matches the expected surcharge
pub fn assert_fee_breakdown(breakdown: &FeeBreakdown, expected_fee: Decimal) {
    assert_eq!(
        breakdown.transaction_fee, expected_fee,
        "Transaction fee mismatch for base {}: expected {}, got {}",
        breakdown.base_amount, expected_fee, breakdown.transaction_fee
    );
    assert_eq!(
        breakdown.total_payable,
        breakdown.base_amount + breakdown.transaction_fee,
        "Total {} is not base {} plus fee {}",
        breakdown.total_payable,
        breakdown.base_amount,
        breakdown.transaction_fee
    );
}

/// Asserts exactly one account in the list is primary and returns it
pub fn assert_single_primary(accounts: &[BusinessAccount]) -> &BusinessAccount {
    let primaries: Vec<&BusinessAccount> = accounts.iter().filter(|a| a.is_primary).collect();
    assert_eq!(
        primaries.len(),
        1,
        "Expected exactly one primary account, found {}: {:?}",
        primaries.len(),
        primaries.iter().map(|a| a.id).collect::<Vec<_>>()
    );
    primaries[0]
}

/// Asserts `paid_at` is set only while successful and `refunded_at` only once refunded
pub fn assert_payment_consistent(payment: &Payment) {
    assert!(
        payment.is_consistent(),
        "Payment {} has status {} but paid_at {:?} and refunded_at {:?}",
        payment.reference,
        payment.status,
        payment.paid_at,
        payment.refunded_at
    );
}

/// Asserts a payment's status
pub fn assert_status(payment: &Payment, expected: PaymentStatus) {
    assert_eq!(
        payment.status, expected,
        "Payment {} status mismatch: expected {}, got {}",
        payment.reference, expected, payment.status
    );
}

/// Asserts a reference has the `{prefix}-{millis}-{student}-{8 hex}` shape
pub fn assert_reference_format(reference: &str, prefix: &str, student_id: i64) {
    let parts: Vec<&str> = reference.split('-').collect();
    assert_eq!(parts.len(), 4, "Reference {reference} does not have four parts");
    assert_eq!(parts[0], prefix, "Reference {reference} has wrong prefix");
    assert!(
        parts[1].parse::<i64>().is_ok(),
        "Reference {reference} timestamp is not numeric"
    );
    assert_eq!(
        parts[2],
        student_id.to_string(),
        "Reference {reference} does not embed student {student_id}"
    );
    assert!(
        parts[3].len() == 8 && parts[3].chars().all(|c| c.is_ascii_hexdigit()),
        "Reference {reference} suffix is not 8 hex characters"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::BusinessAccountBuilder;
    use core_kernel::SchoolId;

    #[test]
    fn test_single_primary_passes() {
        let accounts = vec![
            BusinessAccountBuilder::new(SchoolId::new(1)).with_id(1).primary().build(),
            BusinessAccountBuilder::new(SchoolId::new(1)).with_id(2).build(),
        ];
        assert_eq!(assert_single_primary(&accounts).id.value(), 1);
    }

    #[test]
    #[should_panic(expected = "Expected exactly one primary account")]
    fn test_two_primaries_panics() {
        let accounts = vec![
            BusinessAccountBuilder::new(SchoolId::new(1)).with_id(1).primary().build(),
            BusinessAccountBuilder::new(SchoolId::new(1)).with_id(2).primary().build(),
        ];
        assert_single_primary(&accounts);
    }

    #[test]
    fn test_reference_format() {
        assert_reference_format("PAY-1700000000000-42-0a1b2c3d", "PAY", 42);
    }
}

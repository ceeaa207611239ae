//! Tests for payment records, status transitions and references

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{SchoolId, StudentId};
use domain_payments::reference;
use domain_payments::{Payment, PaymentError, PaymentStats, PaymentStatus, StatusTransition};
use test_utils::{
    assert_payment_consistent, assert_reference_format, assert_status, payment_status_strategy,
    student_id_strategy, PaymentBuilder,
};

const SCHOOL: SchoolId = SchoolId::new(1);

fn payment_in(status: PaymentStatus, student_id: i64) -> Payment {
    let builder = PaymentBuilder::new(SCHOOL, StudentId::new(student_id));
    match status {
        PaymentStatus::Pending => builder,
        PaymentStatus::Successful => builder.successful(),
        PaymentStatus::Failed => builder.failed(),
        PaymentStatus::Refunded => builder.refunded(),
    }
    .build()
}

fn transition_to(target: PaymentStatus) -> Option<StatusTransition> {
    let now = Utc::now();
    match target {
        PaymentStatus::Successful => Some(StatusTransition::succeed(Some("TRX_1".into()), now)),
        PaymentStatus::Failed => Some(StatusTransition::fail()),
        PaymentStatus::Refunded => Some(StatusTransition::refund(now)),
        PaymentStatus::Pending => None,
    }
}

// ============================================================================
// Lifecycle walk
// ============================================================================

mod lifecycle_walk {
    use super::*;

    #[test]
    fn test_paystack_payment_through_refund() {
        let mut payment = PaymentBuilder::new(SCHOOL, StudentId::new(42)).with_id(9).build();
        assert_status(&payment, PaymentStatus::Pending);

        StatusTransition::succeed(Some("4099260516".into()), Utc::now()).apply(&mut payment, Utc::now());
        assert_status(&payment, PaymentStatus::Successful);
        assert_payment_consistent(&payment);

        StatusTransition::refund(Utc::now()).apply(&mut payment, Utc::now());
        assert_status(&payment, PaymentStatus::Refunded);
        assert_payment_consistent(&payment);
        assert!(payment.paid_at.is_none());
        assert_eq!(payment.gateway_reference.as_deref(), Some("4099260516"));
    }

    #[test]
    fn test_manual_payment_has_no_gateway_reference() {
        let payment = PaymentBuilder::new(SCHOOL, StudentId::new(42))
            .manual()
            .with_reference("TELLER-001")
            .successful()
            .build();
        assert_eq!(payment.reference, "TELLER-001");
        assert!(payment.gateway_reference.is_none());
        assert_payment_consistent(&payment);
    }

    #[test]
    fn test_stats_over_mixed_history() {
        let payments = vec![
            PaymentBuilder::new(SCHOOL, StudentId::new(1)).with_id(1).successful().build(),
            PaymentBuilder::new(SCHOOL, StudentId::new(2))
                .with_id(2)
                .with_amount(dec!(12000))
                .successful()
                .build(),
            PaymentBuilder::new(SCHOOL, StudentId::new(3)).with_id(3).failed().build(),
            PaymentBuilder::new(SCHOOL, StudentId::new(4)).with_id(4).refunded().build(),
            PaymentBuilder::new(SCHOOL, StudentId::new(5)).with_id(5).build(),
        ];

        let stats = PaymentStats::from_payments(&payments);

        assert_eq!(stats.total_payments, 5);
        assert_eq!(stats.successful_count, 2);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.refunded_count, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.total_revenue, dec!(17000));
        assert_eq!(stats.total_amount, dec!(32000));
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn built_payments_are_consistent(
        status in payment_status_strategy(),
        student in student_id_strategy()
    ) {
        let payment = payment_in(status, student);
        assert_payment_consistent(&payment);
        prop_assert_eq!(payment.status.as_str().parse::<PaymentStatus>(), Ok(status));
    }

    #[test]
    fn allowed_transitions_keep_timestamps_consistent(
        from in payment_status_strategy(),
        to in payment_status_strategy()
    ) {
        let Some(transition) = transition_to(to) else {
            return Ok(());
        };
        let mut payment = payment_in(from, 42);

        match transition.ensure_from(payment.status) {
            Ok(()) => {
                prop_assert!(from.can_transition_to(to));
                transition.apply(&mut payment, Utc::now());
                assert_status(&payment, to);
                assert_payment_consistent(&payment);
            }
            Err(err) => {
                prop_assert!(!from.can_transition_to(to));
                let is_invalid_transition =
                    matches!(err, PaymentError::InvalidStatusTransition { .. });
                prop_assert!(is_invalid_transition);
            }
        }
    }

    #[test]
    fn generated_references_embed_the_student(student in student_id_strategy()) {
        let now = Utc::now();
        assert_reference_format(&reference::generate(StudentId::new(student), now), "PAY", student);
        assert_reference_format(&reference::generate_manual(StudentId::new(student), now), "MAN", student);
    }
}

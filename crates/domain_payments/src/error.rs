//! Payments domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};

use crate::gateway::GatewayError;

/// Errors that can occur in the payments domain
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Referenced school, student, fee type, account or payment does not
    /// exist within the caller's tenant
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Base amount is zero, negative or not representable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The school has no primary settlement account
    #[error("No business account configured for this school. Please contact your school administrator.")]
    NoSettlementAccount,

    /// A primary account exists but cannot receive funds yet
    #[error("School business account is not properly configured: {0}")]
    SettlementAccountNotConfigured(String),

    /// The gateway answered and refused the request
    #[error("Payment gateway error during {operation}")]
    Gateway {
        operation: String,
        #[source]
        source: GatewayError,
    },

    /// The gateway could not be reached or did not answer in time
    #[error("Payment gateway unavailable during {operation}")]
    GatewayUnavailable {
        operation: String,
        #[source]
        source: GatewayError,
    },

    /// Generated reference collided with an existing payment
    #[error("Duplicate payment reference: {0}")]
    DuplicateReference(String),

    /// A caller-supplied reference already belongs to another payment
    #[error("Payment reference {0} is already in use")]
    ReferenceInUse(String),

    /// Gateway confirmed a charge for a different amount than was requested
    #[error("Charged amount for {reference} does not match: expected {expected_minor}, gateway charged {charged_minor}")]
    VerificationMismatch {
        reference: String,
        expected_minor: i64,
        charged_minor: i64,
    },

    /// Payment status cannot move from `from` to `to`
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Bank account details could not be resolved with the gateway
    #[error("Bank account verification failed: {0}")]
    AccountVerificationFailed(String),

    /// Persistence port failure
    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

impl PaymentError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        PaymentError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true when the caller may retry the same operation later
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::GatewayUnavailable { .. } => true,
            PaymentError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns true if this error reports a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, PaymentError::NotFound { .. })
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        let operation = err.operation().to_string();
        if err.is_transport() {
            PaymentError::GatewayUnavailable {
                operation,
                source: err,
            }
        } else {
            PaymentError::Gateway {
                operation,
                source: err,
            }
        }
    }
}

impl From<PortError> for PaymentError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => PaymentError::NotFound {
                entity: entity_name(&entity_type),
                id,
            },
            other => PaymentError::Storage(other),
        }
    }
}

impl From<MoneyError> for PaymentError {
    fn from(err: MoneyError) -> Self {
        PaymentError::InvalidAmount(err.to_string())
    }
}

fn entity_name(entity_type: &str) -> &'static str {
    match entity_type {
        "School" => "School",
        "Student" => "Student",
        "FeeType" => "Fee type",
        "BusinessAccount" => "Business account",
        "Payment" => "Payment",
        _ => "Record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_retryable() {
        let err: PaymentError = GatewayError::Timeout {
            operation: "verify".into(),
            duration_ms: 30_000,
        }
        .into();
        assert!(matches!(err, PaymentError::GatewayUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rejections_are_not_retryable() {
        let err: PaymentError = GatewayError::Rejected {
            operation: "initialize".into(),
            status: 400,
            message: "Invalid subaccount".into(),
        }
        .into();
        assert!(matches!(err, PaymentError::Gateway { .. }));
        assert!(!err.is_retryable());
        // upstream message stays on the source, not the display string
        assert!(!err.to_string().contains("Invalid subaccount"));
    }

    #[test]
    fn test_port_not_found_maps_to_domain_not_found() {
        let err: PaymentError = PortError::not_found("FeeType", "FEE-3").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Fee type not found: FEE-3");
    }

    #[test]
    fn test_transient_storage_is_retryable() {
        let err: PaymentError = PortError::connection("pool closed").into();
        assert!(err.is_retryable());
        let err: PaymentError = PortError::internal("bad row").into();
        assert!(!err.is_retryable());
    }
}

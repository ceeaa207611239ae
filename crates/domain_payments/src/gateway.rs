//! Payment Gateway Port
//!
//! The operations the payments domain needs from an external payment
//! gateway. The production implementation is
//! [`PaystackGateway`](crate::adapters::PaystackGateway); tests use the
//! recording mock in [`mock`].
//!
//! Every non-2xx answer and every transport failure surfaces as a
//! [`GatewayError`]. Nothing is swallowed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{DomainPort, HealthCheckable};

/// Errors raised by a gateway adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway answered with a non-success status or a negative result
    #[error("{operation} rejected by gateway (status {status}): {message}")]
    Rejected {
        operation: String,
        status: u16,
        message: String,
    },

    /// The request never produced an answer
    #[error("{operation} failed to reach gateway: {message}")]
    Unavailable { operation: String, message: String },

    /// The request exceeded its deadline
    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// The gateway answered with a body we could not understand
    #[error("{operation} returned an unreadable response: {message}")]
    Decode { operation: String, message: String },
}

impl GatewayError {
    pub fn operation(&self) -> &str {
        match self {
            GatewayError::Rejected { operation, .. }
            | GatewayError::Unavailable { operation, .. }
            | GatewayError::Timeout { operation, .. }
            | GatewayError::Decode { operation, .. } => operation,
        }
    }

    /// True when the outcome of the call is unknown rather than refused
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable { .. } | GatewayError::Timeout { .. }
        ) || matches!(self, GatewayError::Rejected { status, .. } if *status >= 500)
    }
}

/// Checkout request sent to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Total payable in minor units
    pub amount_minor: i64,
    pub reference: String,
    /// Settlement subaccount; funds go to the platform account when absent
    pub subaccount_code: Option<String>,
    pub metadata: serde_json::Value,
}

/// Checkout session created by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub authorization_url: String,
    pub access_code: String,
}

/// Transaction outcome reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Charge confirmed
    Success,
    /// Charge explicitly did not go through (failed, abandoned, reversed)
    Failed(String),
    /// Charge has not reached a final state yet (pending, ongoing, queued)
    InProgress(String),
}

impl TransactionStatus {
    /// Maps a gateway status string onto the three outcomes
    pub fn from_gateway(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "success" => TransactionStatus::Success,
            "failed" | "abandoned" | "reversed" => TransactionStatus::Failed(status.to_string()),
            _ => TransactionStatus::InProgress(status.to_string()),
        }
    }
}

/// Result of a verification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub status: TransactionStatus,
    /// Gateway's own transaction reference
    pub gateway_reference: Option<String>,
    /// Amount the gateway actually charged, in minor units
    pub amount_minor: Option<i64>,
}

/// Result of a bank account lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResolution {
    pub valid: bool,
    pub resolved_name: Option<String>,
}

/// A bank supported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub code: String,
    pub name: String,
}

/// Subaccount provisioning request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubaccountRequest {
    pub business_name: String,
    pub settlement_bank: String,
    pub account_number: String,
    pub percentage_charge: rust_decimal::Decimal,
}

/// The port every payment gateway adapter implements
#[async_trait]
pub trait PaymentGateway: DomainPort + HealthCheckable {
    /// Creates a checkout session
    ///
    /// When `request.subaccount_code` is present it is forwarded so the funds
    /// settle to the school rather than the platform.
    async fn initialize(&self, request: InitializeRequest) -> Result<Checkout, GatewayError>;

    /// Asks the gateway for the current state of a transaction
    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError>;

    /// Looks up the holder of a bank account
    async fn resolve_account_number(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<AccountResolution, GatewayError>;

    /// Lists the banks the gateway can settle to
    async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError>;

    /// Provisions a settlement subaccount and returns its code
    async fn create_subaccount(&self, request: SubaccountRequest) -> Result<String, GatewayError>;
}

/// Recording gateway for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory gateway that records every outbound request
    #[derive(Debug, Default)]
    pub struct RecordingGateway {
        initialize_requests: Arc<RwLock<Vec<InitializeRequest>>>,
        subaccount_requests: Arc<RwLock<Vec<SubaccountRequest>>>,
        verify_calls: AtomicUsize,
        outcomes: Arc<RwLock<HashMap<String, Verification>>>,
        initialize_error: Arc<RwLock<Option<GatewayError>>>,
        verify_error: Arc<RwLock<Option<GatewayError>>>,
        resolved_accounts: Arc<RwLock<HashMap<(String, String), String>>>,
        banks: Arc<RwLock<Vec<Bank>>>,
    }

    impl RecordingGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets what `verify` reports for a reference
        pub async fn set_outcome(&self, reference: &str, status: TransactionStatus) {
            self.outcomes.write().await.insert(
                reference.to_string(),
                Verification {
                    status,
                    gateway_reference: Some(format!("TRX_{reference}")),
                    amount_minor: None,
                },
            );
        }

        /// Sets a successful `verify` result that reports the charged amount
        pub async fn set_charged(&self, reference: &str, amount_minor: i64) {
            self.outcomes.write().await.insert(
                reference.to_string(),
                Verification {
                    status: TransactionStatus::Success,
                    gateway_reference: Some(format!("TRX_{reference}")),
                    amount_minor: Some(amount_minor),
                },
            );
        }

        /// Makes every subsequent `initialize` fail
        pub async fn fail_initialize(&self, error: GatewayError) {
            *self.initialize_error.write().await = Some(error);
        }

        /// Makes every subsequent `verify` fail
        pub async fn fail_verify(&self, error: GatewayError) {
            *self.verify_error.write().await = Some(error);
        }

        /// Registers an account the gateway can resolve
        pub async fn add_resolvable_account(&self, account_number: &str, bank_code: &str, name: &str) {
            self.resolved_accounts.write().await.insert(
                (account_number.to_string(), bank_code.to_string()),
                name.to_string(),
            );
        }

        pub async fn set_banks(&self, banks: Vec<Bank>) {
            *self.banks.write().await = banks;
        }

        pub async fn initialize_requests(&self) -> Vec<InitializeRequest> {
            self.initialize_requests.read().await.clone()
        }

        pub async fn subaccount_requests(&self) -> Vec<SubaccountRequest> {
            self.subaccount_requests.read().await.clone()
        }

        pub fn verify_calls(&self) -> usize {
            self.verify_calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for RecordingGateway {}

    #[async_trait]
    impl HealthCheckable for RecordingGateway {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "recording-gateway".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn initialize(&self, request: InitializeRequest) -> Result<Checkout, GatewayError> {
            let reference = request.reference.clone();
            self.initialize_requests.write().await.push(request);
            if let Some(error) = self.initialize_error.read().await.clone() {
                return Err(error);
            }
            Ok(Checkout {
                authorization_url: format!("https://checkout.test/{reference}"),
                access_code: format!("access_{reference}"),
            })
        }

        async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.verify_error.read().await.clone() {
                return Err(error);
            }
            self.outcomes
                .read()
                .await
                .get(reference)
                .cloned()
                .ok_or_else(|| GatewayError::Rejected {
                    operation: "verify".to_string(),
                    status: 404,
                    message: "Transaction reference not found".to_string(),
                })
        }

        async fn resolve_account_number(
            &self,
            account_number: &str,
            bank_code: &str,
        ) -> Result<AccountResolution, GatewayError> {
            let name = self
                .resolved_accounts
                .read()
                .await
                .get(&(account_number.to_string(), bank_code.to_string()))
                .cloned();
            Ok(AccountResolution {
                valid: name.is_some(),
                resolved_name: name,
            })
        }

        async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError> {
            Ok(self.banks.read().await.clone())
        }

        async fn create_subaccount(&self, request: SubaccountRequest) -> Result<String, GatewayError> {
            let mut requests = self.subaccount_requests.write().await;
            requests.push(request);
            Ok(format!("ACCT_mock{}", requests.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TransactionStatus::from_gateway("success"), TransactionStatus::Success);
        assert_eq!(
            TransactionStatus::from_gateway("abandoned"),
            TransactionStatus::Failed("abandoned".into())
        );
        assert_eq!(
            TransactionStatus::from_gateway("ongoing"),
            TransactionStatus::InProgress("ongoing".into())
        );
    }

    #[test]
    fn test_server_errors_count_as_transport() {
        let err = GatewayError::Rejected {
            operation: "verify".into(),
            status: 502,
            message: "Bad gateway".into(),
        };
        assert!(err.is_transport());

        let err = GatewayError::Rejected {
            operation: "verify".into(),
            status: 400,
            message: "Invalid key".into(),
        };
        assert!(!err.is_transport());
    }
}

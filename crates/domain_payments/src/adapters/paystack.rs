//! Paystack Gateway Adapter
//!
//! Implements [`PaymentGateway`] over the Paystack REST API.
//!
//! | Operation | Paystack endpoint |
//! |-----------|-------------------|
//! | initialize | `POST /transaction/initialize` |
//! | verify | `GET /transaction/verify/:reference` |
//! | resolve_account_number | `GET /bank/resolve` |
//! | list_banks | `GET /bank` |
//! | create_subaccount | `POST /subaccount` |
//!
//! Requests authenticate with the deployment's secret key as a bearer
//! token. Every request is bounded by the configured timeout.
//!
//! Errors are mapped onto [`GatewayError`]:
//! - non-2xx answers, or `"status": false` envelopes -> `Rejected`
//! - timeouts -> `Timeout`
//! - connection failures -> `Unavailable`
//! - unreadable bodies -> `Decode`
//!
//! The raw upstream body is logged here and nowhere else.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use core_kernel::{AdapterHealth, Currency, DomainPort, HealthCheckResult, HealthCheckable};

use crate::gateway::{
    AccountResolution, Bank, Checkout, GatewayError, InitializeRequest, PaymentGateway,
    SubaccountRequest, TransactionStatus, Verification,
};

/// Default Paystack API root
pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Configuration for the Paystack adapter
#[derive(Clone)]
pub struct PaystackConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Secret key sent as the bearer token
    pub secret_key: String,
    /// Where Paystack redirects the payer after checkout
    pub callback_url: Option<String>,
    /// Upper bound on every request
    pub timeout: Duration,
    /// Settlement currency; filters the bank list
    pub currency: Currency,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: String::new(),
            callback_url: None,
            timeout: Duration::from_secs(30),
            currency: Currency::NGN,
        }
    }
}

impl fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("timeout", &self.timeout)
            .field("currency", &self.currency)
            .finish()
    }
}

/// Paystack wraps every answer in this envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializePayload<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    metadata: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subaccount: Option<&'a str>,
    /// The subaccount bears the Paystack charge
    #[serde(skip_serializing_if = "Option::is_none")]
    bearer: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ResolveData {
    account_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BankData {
    name: String,
    code: String,
}

#[derive(Debug, Serialize)]
struct SubaccountPayload<'a> {
    business_name: &'a str,
    settlement_bank: &'a str,
    account_number: &'a str,
    percentage_charge: f64,
}

#[derive(Debug, Deserialize)]
struct SubaccountData {
    subaccount_code: String,
}

/// Paystack implementation of the gateway port
#[derive(Debug, Clone)]
pub struct PaystackGateway {
    http: reqwest::Client,
    config: PaystackConfig,
}

impl PaystackGateway {
    /// Creates the adapter and its HTTP client
    pub fn new(config: PaystackConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable {
                operation: "client".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Verify endpoint with the reference percent-encoded as one path segment
    fn verify_url(&self, reference: &str) -> Result<reqwest::Url, GatewayError> {
        let invalid = |message: String| GatewayError::Unavailable {
            operation: "verify".to_string(),
            message,
        };
        let mut url = reqwest::Url::parse(&self.url("/transaction/verify"))
            .map_err(|e| invalid(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base url cannot carry a path".to_string()))?
            .push(reference);
        Ok(url)
    }

    fn transport_error(&self, operation: &str, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                operation: operation.to_string(),
                duration_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            GatewayError::Unavailable {
                operation: operation.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Sends a request and unwraps the Paystack envelope
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request
            .header(AUTHORIZATION, format!("Bearer {}", self.config.secret_key))
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;

        let response = Self::ensure_success(response, operation).await?;

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(operation, e)
            } else {
                GatewayError::Decode {
                    operation: operation.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        if !envelope.status {
            error!(operation, message = %envelope.message, "paystack reported failure");
            return Err(GatewayError::Rejected {
                operation: operation.to_string(),
                status: 200,
                message: envelope.message,
            });
        }

        envelope.data.ok_or_else(|| GatewayError::Decode {
            operation: operation.to_string(),
            message: "response envelope has no data".to_string(),
        })
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = match response.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        error!(
            status = %status,
            response_body = %body,
            operation = %operation,
            "paystack api request failed"
        );

        Err(GatewayError::Rejected {
            operation: operation.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

impl DomainPort for PaystackGateway {}

#[async_trait]
impl HealthCheckable for PaystackGateway {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .send::<Vec<BankData>>(
                "health_check",
                self.http.get(self.url("/bank")).query(&[("perPage", "1")]),
            )
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("paystack", latency_ms),
            Err(e) => HealthCheckResult {
                adapter_id: "paystack".to_string(),
                status: if e.is_transport() {
                    AdapterHealth::Unhealthy
                } else {
                    AdapterHealth::Degraded
                },
                latency_ms,
                message: Some(e.to_string()),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    async fn initialize(&self, request: InitializeRequest) -> Result<Checkout, GatewayError> {
        let subaccount = request.subaccount_code.as_deref();
        let payload = InitializePayload {
            email: &request.email,
            amount: request.amount_minor,
            reference: &request.reference,
            metadata: &request.metadata,
            callback_url: self.config.callback_url.as_deref(),
            subaccount,
            bearer: subaccount.map(|_| "account"),
        };
        debug!(amount = request.amount_minor, subaccount = ?subaccount, "initializing transaction");

        let data: InitializeData = self
            .send(
                "initialize",
                self.http.post(self.url("/transaction/initialize")).json(&payload),
            )
            .await?;

        Ok(Checkout {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
        })
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
        let data: VerifyData = self
            .send("verify", self.http.get(self.verify_url(reference)?))
            .await?;
        debug!(gateway_status = %data.status, "transaction verified");

        Ok(Verification {
            status: TransactionStatus::from_gateway(&data.status),
            gateway_reference: data.id.map(|id| id.to_string()).or(data.reference),
            amount_minor: data.amount,
        })
    }

    #[instrument(skip(self, account_number), fields(bank_code = %bank_code))]
    async fn resolve_account_number(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<AccountResolution, GatewayError> {
        let data: ResolveData = self
            .send(
                "resolve_account_number",
                self.http
                    .get(self.url("/bank/resolve"))
                    .query(&[("account_number", account_number), ("bank_code", bank_code)]),
            )
            .await?;

        let resolved_name = data.account_name.filter(|name| !name.trim().is_empty());
        Ok(AccountResolution {
            valid: resolved_name.is_some(),
            resolved_name,
        })
    }

    #[instrument(skip(self))]
    async fn list_banks(&self) -> Result<Vec<Bank>, GatewayError> {
        let data: Vec<BankData> = self
            .send(
                "list_banks",
                self.http
                    .get(self.url("/bank"))
                    .query(&[("currency", self.config.currency.code())]),
            )
            .await?;

        Ok(data
            .into_iter()
            .map(|bank| Bank {
                code: bank.code,
                name: bank.name,
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(settlement_bank = %request.settlement_bank))]
    async fn create_subaccount(&self, request: SubaccountRequest) -> Result<String, GatewayError> {
        let payload = SubaccountPayload {
            business_name: &request.business_name,
            settlement_bank: &request.settlement_bank,
            account_number: &request.account_number,
            percentage_charge: request.percentage_charge.to_f64().unwrap_or_default(),
        };
        let data: SubaccountData = self
            .send(
                "create_subaccount",
                self.http.post(self.url("/subaccount")).json(&payload),
            )
            .await?;
        Ok(data.subaccount_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secret() {
        let config = PaystackConfig {
            secret_key: "sk_live_very_secret".to_string(),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk_live_very_secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_payload_without_subaccount_omits_bearer() {
        let metadata = serde_json::json!({});
        let payload = InitializePayload {
            email: "x@y.com",
            amount: 100,
            reference: "PAY-1",
            metadata: &metadata,
            callback_url: None,
            subaccount: None,
            bearer: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("subaccount").is_none());
        assert!(value.get("bearer").is_none());
        assert!(value.get("callback_url").is_none());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let gateway = PaystackGateway::new(PaystackConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(gateway.url("/bank"), "http://localhost:9000/bank");
    }

    #[test]
    fn test_verify_url_encodes_reference() {
        let gateway = PaystackGateway::new(PaystackConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        let url = gateway.verify_url("TELLER 1/A?x#y").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/transaction/verify/TELLER%201%2FA%3Fx%23y"
        );
    }
}

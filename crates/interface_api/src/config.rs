//! API configuration
//!
//! Loaded from `API_`-prefixed environment variables. Every field has a
//! default except the Paystack secret key, which also signs webhooks and
//! must be set.

use std::time::Duration;

use serde::Deserialize;

use core_kernel::Currency;
use domain_payments::adapters::{PaystackConfig, DEFAULT_BASE_URL};

/// API configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level, overridden by `RUST_LOG`
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
    /// Paystack API root
    pub paystack_base_url: String,
    /// Paystack secret key; also signs webhooks
    pub paystack_secret_key: String,
    /// Where the payer lands after checkout
    pub paystack_callback_url: Option<String>,
    /// Upper bound on each gateway call
    pub gateway_timeout_secs: u64,
    /// Settlement currency
    pub currency: Currency,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/school_fees".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            paystack_base_url: DEFAULT_BASE_URL.to_string(),
            paystack_secret_key: String::new(),
            paystack_callback_url: None,
            gateway_timeout_secs: 30,
            currency: Currency::NGN,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("paystack_base_url", &self.paystack_base_url)
            .field("paystack_callback_url", &self.paystack_callback_url)
            .field("gateway_timeout_secs", &self.gateway_timeout_secs)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.paystack_secret_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "API_PAYSTACK_SECRET_KEY must be set".to_string(),
            ));
        }
        if self.gateway_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "API_GATEWAY_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Settings for the Paystack adapter
    pub fn paystack(&self) -> PaystackConfig {
        PaystackConfig {
            base_url: self.paystack_base_url.clone(),
            secret_key: self.paystack_secret_key.clone(),
            callback_url: self.paystack_callback_url.clone(),
            timeout: Duration::from_secs(self.gateway_timeout_secs),
            currency: self.currency,
        }
    }
}

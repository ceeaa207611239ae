//! Gateway webhook authentication
//!
//! Paystack signs each webhook body with HMAC-SHA512 over the deployment's
//! secret key and sends the hex digest in `x-paystack-signature`.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Event type that confirms a completed charge
pub const CHARGE_SUCCESS: &str = "charge.success";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("signature is not valid hex")]
    MalformedSignature,

    #[error("signature does not match payload")]
    InvalidSignature,

    #[error("webhook secret is not usable")]
    InvalidSecret,

    #[error("webhook payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A webhook event; only the fields reconciliation needs are typed
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WebhookEvent {
    /// Platform reference of a `charge.success` event
    pub fn charge_reference(&self) -> Option<&str> {
        if self.event != CHARGE_SUCCESS {
            return None;
        }
        self.data.get("reference").and_then(|r| r.as_str())
    }
}

/// Checks webhook signatures against the deployment secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Hex HMAC-SHA512 of `payload`
    pub fn sign(&self, payload: &[u8]) -> Result<String, WebhookError> {
        let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Authenticates `payload` and parses the event
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent, WebhookError> {
        let provided = hex::decode(signature.trim()).map_err(|_| WebhookError::MalformedSignature)?;

        let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(payload);
        mac.verify_slice(&provided)
            .map_err(|_| WebhookError::InvalidSignature)?;

        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event":"charge.success","data":{"reference":"PAY-1-42-abcd1234","status":"success"}}"#;

    #[test]
    fn test_valid_signature() {
        let verifier = WebhookVerifier::new("sk_test_secret");
        let signature = verifier.sign(BODY).unwrap();

        let event = verifier.verify(BODY, &signature).unwrap();
        assert_eq!(event.charge_reference(), Some("PAY-1-42-abcd1234"));
    }

    #[test]
    fn test_signature_from_other_secret_rejected() {
        let signature = WebhookVerifier::new("sk_test_other").sign(BODY).unwrap();
        let result = WebhookVerifier::new("sk_test_secret").verify(BODY, &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let verifier = WebhookVerifier::new("sk_test_secret");
        let signature = verifier.sign(BODY).unwrap();
        let tampered = String::from_utf8_lossy(BODY).replace("42", "43");
        assert!(matches!(
            verifier.verify(tampered.as_bytes(), &signature),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_hex_signature() {
        let verifier = WebhookVerifier::new("sk_test_secret");
        assert!(matches!(
            verifier.verify(BODY, "not-hex"),
            Err(WebhookError::MalformedSignature)
        ));
    }

    #[test]
    fn test_other_events_have_no_charge_reference() {
        let event = WebhookEvent {
            event: "transfer.success".to_string(),
            data: serde_json::json!({ "reference": "TRF-1" }),
        };
        assert_eq!(event.charge_reference(), None);
    }
}

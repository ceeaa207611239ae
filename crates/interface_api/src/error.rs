//! API error handling
//!
//! Domain errors are mapped to status codes here. Gateway failures never
//! carry the upstream message to the client; the adapter has already logged
//! it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_payments::PaymentError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Settlement unavailable: {0}")]
    SettlementUnavailable(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
            ApiError::SettlementUnavailable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "settlement_unavailable", msg.clone())
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "gateway_error", msg.clone()),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg.clone())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PaymentError::InvalidAmount(_) => ApiError::BadRequest(err.to_string()),
            PaymentError::NoSettlementAccount | PaymentError::SettlementAccountNotConfigured(_) => {
                ApiError::SettlementUnavailable(err.to_string())
            }
            PaymentError::AccountVerificationFailed(_) => ApiError::Validation(err.to_string()),
            PaymentError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            PaymentError::Gateway { .. } => {
                ApiError::BadGateway("The payment gateway could not process the request".to_string())
            }
            PaymentError::GatewayUnavailable { .. } => ApiError::ServiceUnavailable(
                "The payment gateway is unavailable, please retry".to_string(),
            ),
            PaymentError::VerificationMismatch { .. } => {
                error!(error = %err, "charged amount mismatch");
                ApiError::Conflict("Payment could not be confirmed; it has been held for review".to_string())
            }
            PaymentError::ReferenceInUse(_) => ApiError::Conflict(err.to_string()),
            PaymentError::DuplicateReference(_) => {
                error!(error = %err, "payment reference collision");
                ApiError::Internal("Payment could not be created".to_string())
            }
            PaymentError::Storage(ref source) if source.is_transient() => {
                error!(error = %err, "storage unavailable");
                ApiError::ServiceUnavailable("Storage is temporarily unavailable".to_string())
            }
            PaymentError::Storage(_) => {
                error!(error = %err, "storage failure");
                ApiError::Internal("Unexpected storage error".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::Unauthorized
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

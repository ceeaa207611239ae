//! Gateway webhook handler
//!
//! A `charge.success` event is reconciled through the same verification
//! path as the payer's callback, so receiving both is harmless.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use domain_payments::webhook::SIGNATURE_HEADER;

use crate::{error::ApiError, AppState};

pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let event = state.webhooks.verify(&body, signature).map_err(|e| {
        warn!(error = %e, "rejected webhook");
        ApiError::Unauthorized
    })?;

    let Some(reference) = event.charge_reference() else {
        debug!(event = %event.event, "ignoring webhook event");
        return Ok((StatusCode::OK, Json(json!({ "received": true }))));
    };

    match state.payments.verify_payment(reference).await {
        Ok(result) => {
            info!(reference, outcome = ?result.outcome, "webhook reconciled payment");
        }
        Err(err) if err.is_not_found() => {
            warn!(reference, "webhook for unknown payment reference");
        }
        Err(err) => return Err(err.into()),
    }

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}

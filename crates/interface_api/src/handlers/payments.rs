//! Payment handlers
//!
//! Checkout, verification and the fee quote are public. Everything under
//! `/schools/:school_id` requires a principal with access to that school.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use validator::Validate;

use core_kernel::{FeeTypeId, PaymentId, SchoolId, StudentId};
use domain_payments::{FeeQuote, InitializedPayment, Payment, PaymentStats};

use crate::auth::Principal;
use crate::dto::payments::*;
use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SchoolPath {
    pub school_id: SchoolId,
}

#[derive(Debug, Deserialize)]
pub struct PaymentPath {
    pub school_id: SchoolId,
    pub id: PaymentId,
}

#[derive(Debug, Deserialize)]
pub struct StudentPath {
    pub school_id: SchoolId,
    pub student_id: StudentId,
}

#[derive(Debug, Deserialize)]
pub struct QuotePath {
    pub school_id: SchoolId,
    pub fee_type_id: FeeTypeId,
}

/// Starts a checkout
pub async fn initialize_payment(
    State(state): State<AppState>,
    Json(body): Json<InitializePaymentBody>,
) -> Result<(StatusCode, Json<InitializedPayment>), ApiError> {
    body.validate()?;
    let initialized = state.payments.initialize_payment(body.into()).await?;
    Ok((StatusCode::CREATED, Json(initialized)))
}

/// Reconciles a payment with the gateway
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let result = state.payments.verify_payment(&reference).await?;
    Ok(Json(result.into()))
}

/// Previews what a payer will be charged
pub async fn quote_fee(
    State(state): State<AppState>,
    Path(path): Path<QuotePath>,
) -> Result<Json<FeeQuote>, ApiError> {
    Ok(Json(state.payments.quote_fee(path.school_id, path.fee_type_id).await?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<SchoolPath>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    principal.require_view(path.school_id)?;
    let status = query.status()?;
    Ok(Json(state.payments.list_payments(path.school_id, status).await?))
}

pub async fn payment_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<SchoolPath>,
) -> Result<Json<PaymentStats>, ApiError> {
    principal.require_view(path.school_id)?;
    Ok(Json(state.payments.payment_stats(path.school_id).await?))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<PaymentPath>,
) -> Result<Json<Payment>, ApiError> {
    principal.require_view(path.school_id)?;
    Ok(Json(state.payments.get_payment(path.school_id, path.id).await?))
}

pub async fn student_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<StudentPath>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    principal.require_view(path.school_id)?;
    Ok(Json(
        state
            .payments
            .student_payments(path.school_id, path.student_id)
            .await?,
    ))
}

/// Records an offline payment
pub async fn record_manual_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<SchoolPath>,
    Json(body): Json<ManualPaymentBody>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    principal.require_view(path.school_id)?;
    body.validate()?;
    let payment = state
        .payments
        .record_manual_payment(body.into_request(path.school_id))
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<PaymentPath>,
) -> Result<Json<Payment>, ApiError> {
    principal.require_manage(path.school_id)?;
    Ok(Json(state.payments.refund_payment(path.school_id, path.id).await?))
}

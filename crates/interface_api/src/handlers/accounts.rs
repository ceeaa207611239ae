//! Settlement account handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use validator::Validate;

use core_kernel::{BusinessAccountId, SchoolId};
use domain_payments::{Bank, BusinessAccount};

use crate::auth::Principal;
use crate::dto::accounts::AddAccountBody;
use crate::handlers::payments::SchoolPath;
use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct AccountPath {
    pub school_id: SchoolId,
    pub id: BusinessAccountId,
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<SchoolPath>,
) -> Result<Json<Vec<BusinessAccount>>, ApiError> {
    principal.require_view(path.school_id)?;
    Ok(Json(state.accounts.list_accounts(path.school_id).await?))
}

/// Verifies and stores a settlement account
pub async fn add_account(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<SchoolPath>,
    Json(body): Json<AddAccountBody>,
) -> Result<(StatusCode, Json<BusinessAccount>), ApiError> {
    principal.require_manage(path.school_id)?;
    body.validate()?;
    let account = state
        .accounts
        .add_account(body.into_request(path.school_id))
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn set_primary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(path): Path<AccountPath>,
) -> Result<Json<BusinessAccount>, ApiError> {
    principal.require_manage(path.school_id)?;
    Ok(Json(state.accounts.set_primary(path.school_id, path.id).await?))
}

pub async fn list_banks(State(state): State<AppState>) -> Result<Json<Vec<Bank>>, ApiError> {
    Ok(Json(state.accounts.list_banks().await?))
}

//! Settlement account onboarding
//!
//! A school adds a bank account; the gateway confirms the account holder and
//! provisions a settlement subaccount before anything is stored. Only the
//! resulting verified account can become a payment's settlement target.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use core_kernel::{BusinessAccountId, SchoolId};

use crate::account::{BusinessAccount, NewBusinessAccount};
use crate::error::PaymentError;
use crate::gateway::{Bank, GatewayError, PaymentGateway, SubaccountRequest};
use crate::ports::{AccountStore, SchoolDirectory};

/// Input for adding a settlement account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAccountRequest {
    pub school_id: SchoolId,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub is_primary: bool,
}

/// Application service for settlement accounts
#[derive(Clone)]
pub struct AccountService {
    directory: Arc<dyn SchoolDirectory>,
    accounts: Arc<dyn AccountStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl AccountService {
    pub fn new(
        directory: Arc<dyn SchoolDirectory>,
        accounts: Arc<dyn AccountStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            directory,
            accounts,
            gateway,
        }
    }

    /// Verifies a bank account with the gateway and stores it
    ///
    /// # Errors
    ///
    /// * `NotFound` - the school does not exist
    /// * `AccountVerificationFailed` - the gateway could not resolve the account
    /// * `Gateway` / `GatewayUnavailable` - subaccount provisioning failed
    #[instrument(skip(self, request), fields(school_id = %request.school_id, bank_code = %request.bank_code))]
    pub async fn add_account(&self, request: AddAccountRequest) -> Result<BusinessAccount, PaymentError> {
        let school = self.directory.get_school(request.school_id).await?;

        let resolution = self
            .gateway
            .resolve_account_number(&request.account_number, &request.bank_code)
            .await
            .map_err(|err| match err {
                GatewayError::Rejected { .. } if !err.is_transport() => {
                    warn!(error = %err, "gateway could not resolve account");
                    PaymentError::AccountVerificationFailed(
                        "the account number could not be resolved for this bank".to_string(),
                    )
                }
                other => PaymentError::from(other),
            })?;

        let resolved_name = match resolution.resolved_name {
            Some(name) if resolution.valid => name,
            _ => {
                return Err(PaymentError::AccountVerificationFailed(
                    "the account number could not be resolved for this bank".to_string(),
                ))
            }
        };

        let subaccount_code = self
            .gateway
            .create_subaccount(SubaccountRequest {
                business_name: school.name.clone(),
                settlement_bank: request.bank_code.clone(),
                account_number: request.account_number.clone(),
                percentage_charge: Decimal::ZERO,
            })
            .await?;

        let account = self
            .accounts
            .insert(NewBusinessAccount {
                school_id: school.id,
                bank_name: request.bank_name,
                bank_code: request.bank_code,
                account_number: request.account_number,
                account_name: resolved_name,
                is_primary: request.is_primary,
                is_verified: true,
                subaccount_code: Some(subaccount_code),
            })
            .await?;

        info!(account_id = %account.id, is_primary = account.is_primary, "settlement account added");
        Ok(account)
    }

    /// Lists a school's accounts, primary first
    pub async fn list_accounts(&self, school_id: SchoolId) -> Result<Vec<BusinessAccount>, PaymentError> {
        Ok(self.accounts.list_for_school(school_id).await?)
    }

    /// Makes one account the school's only primary account
    #[instrument(skip(self), fields(school_id = %school_id, account_id = %account_id))]
    pub async fn set_primary(
        &self,
        school_id: SchoolId,
        account_id: BusinessAccountId,
    ) -> Result<BusinessAccount, PaymentError> {
        let account = self
            .accounts
            .set_primary(school_id, account_id)
            .await?
            .ok_or_else(|| PaymentError::not_found("Business account", account_id))?;
        info!("primary settlement account changed");
        Ok(account)
    }

    /// Banks the gateway can settle to
    pub async fn list_banks(&self) -> Result<Vec<Bank>, PaymentError> {
        Ok(self.gateway.list_banks().await?)
    }
}

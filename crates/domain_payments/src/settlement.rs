//! Settlement routing
//!
//! Finds the account a school's funds settle to. Resolution fails closed:
//! without exactly one verified primary account carrying a subaccount code
//! no payment is created and the gateway is not contacted.

use std::sync::Arc;

use tracing::{instrument, warn};

use core_kernel::SchoolId;

use crate::account::BusinessAccount;
use crate::error::PaymentError;
use crate::ports::AccountStore;

/// A resolved settlement target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementTarget {
    pub account: BusinessAccount,
    pub subaccount_code: String,
}

/// Resolves a school's primary settlement account
pub struct SettlementResolver {
    accounts: Arc<dyn AccountStore>,
}

impl SettlementResolver {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Returns the school's primary account and its subaccount code
    ///
    /// # Errors
    ///
    /// * `NoSettlementAccount` - the school has no primary account
    /// * `SettlementAccountNotConfigured` - the primary account is unverified,
    ///   has no subaccount code, or is not the only primary
    #[instrument(skip(self), fields(school_id = %school_id))]
    pub async fn resolve_primary_account(
        &self,
        school_id: SchoolId,
    ) -> Result<SettlementTarget, PaymentError> {
        let mut primaries = self.accounts.primary_accounts(school_id).await?;

        if primaries.len() > 1 {
            warn!(count = primaries.len(), "school has more than one primary account");
            return Err(PaymentError::SettlementAccountNotConfigured(
                "more than one primary account".to_string(),
            ));
        }

        let account = primaries.pop().ok_or(PaymentError::NoSettlementAccount)?;

        if !account.is_verified {
            warn!(account_id = %account.id, "primary account is not verified");
            return Err(PaymentError::SettlementAccountNotConfigured(
                "primary account is not verified".to_string(),
            ));
        }

        let subaccount_code = account
            .settlement_code()
            .map(str::to_string)
            .ok_or_else(|| {
                warn!(account_id = %account.id, "primary account has no subaccount code");
                PaymentError::SettlementAccountNotConfigured(
                    "primary account has no subaccount code".to_string(),
                )
            })?;

        Ok(SettlementTarget {
            account,
            subaccount_code,
        })
    }
}

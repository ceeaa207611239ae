//! School settlement accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BusinessAccountId, SchoolId};

/// A school's bank account, the destination of settled funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessAccount {
    pub id: BusinessAccountId,
    pub school_id: SchoolId,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub is_primary: bool,
    pub is_verified: bool,
    /// Gateway subaccount that routes funds to this bank account
    pub subaccount_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessAccount {
    /// Returns the subaccount code if this account can receive funds
    pub fn settlement_code(&self) -> Option<&str> {
        if !self.is_verified {
            return None;
        }
        self.subaccount_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }
}

/// An account ready to be stored after gateway verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBusinessAccount {
    pub school_id: SchoolId,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub is_primary: bool,
    pub is_verified: bool,
    pub subaccount_code: Option<String>,
}

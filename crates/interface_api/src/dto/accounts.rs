//! Settlement account DTOs

use serde::Deserialize;
use validator::Validate;

use core_kernel::SchoolId;
use domain_payments::AddAccountRequest;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddAccountBody {
    #[validate(length(min = 1, max = 255))]
    pub bank_name: String,
    #[validate(length(min = 3, max = 20))]
    pub bank_code: String,
    #[validate(length(equal = 10))]
    pub account_number: String,
    #[validate(length(min = 1, max = 255))]
    pub account_name: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl AddAccountBody {
    pub fn into_request(self, school_id: SchoolId) -> AddAccountRequest {
        AddAccountRequest {
            school_id,
            bank_name: self.bank_name,
            bank_code: self.bank_code,
            account_number: self.account_number,
            account_name: self.account_name,
            is_primary: self.is_primary,
        }
    }
}

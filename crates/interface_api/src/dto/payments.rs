//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{FeeTypeId, SchoolId, StudentId};
use domain_payments::{
    InitializePaymentRequest, ManualPaymentRequest, Payment, PaymentStatus, VerificationResult,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentBody {
    #[validate(range(min = 1))]
    pub school_id: i64,
    #[validate(range(min = 1))]
    pub student_id: i64,
    #[validate(range(min = 1))]
    pub fee_type_id: i64,
    #[validate(email)]
    pub email: String,
}

impl From<InitializePaymentBody> for InitializePaymentRequest {
    fn from(body: InitializePaymentBody) -> Self {
        InitializePaymentRequest {
            school_id: SchoolId::new(body.school_id),
            student_id: StudentId::new(body.student_id),
            fee_type_id: FeeTypeId::new(body.fee_type_id),
            email: body.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualPaymentBody {
    #[validate(range(min = 1))]
    pub student_id: i64,
    #[validate(range(min = 1))]
    pub fee_type_id: i64,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 100))]
    pub reference: Option<String>,
}

impl ManualPaymentBody {
    pub fn into_request(self, school_id: SchoolId) -> ManualPaymentRequest {
        ManualPaymentRequest {
            school_id,
            student_id: StudentId::new(self.student_id),
            fee_type_id: FeeTypeId::new(self.fee_type_id),
            amount: self.amount,
            paid_at: self.paid_at,
            reference: self.reference,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    pub status: Option<String>,
}

impl ListPaymentsQuery {
    pub fn status(&self) -> Result<Option<PaymentStatus>, ApiError> {
        self.status
            .as_deref()
            .map(|s| s.parse::<PaymentStatus>().map_err(ApiError::BadRequest))
            .transpose()
    }
}

/// Body of the verification endpoint
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub message: String,
    pub payment: Payment,
}

impl From<VerificationResult> for VerifyPaymentResponse {
    fn from(result: VerificationResult) -> Self {
        Self {
            message: result.message,
            payment: result.payment,
        }
    }
}

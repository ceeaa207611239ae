//! Authentication and authorization
//!
//! A JWT carries one [`Principal`]. The auth middleware decodes it once and
//! places it in the request extensions; handlers ask it whether the caller
//! may view or manage the school in the path.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{SchoolId, UserId};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Principal {
    /// Owns one or more schools
    SchoolOwner {
        user_id: UserId,
        school_ids: Vec<SchoolId>,
    },
    /// Works at a single school
    SchoolStaff { user_id: UserId, school_id: SchoolId },
    /// Operates the platform
    PlatformAdmin { user_id: UserId },
}

impl Principal {
    pub fn user_id(&self) -> UserId {
        match self {
            Principal::SchoolOwner { user_id, .. }
            | Principal::SchoolStaff { user_id, .. }
            | Principal::PlatformAdmin { user_id } => *user_id,
        }
    }

    /// Whether the caller may read the school's payments and accounts
    pub fn can_view(&self, school_id: SchoolId) -> bool {
        match self {
            Principal::SchoolOwner { school_ids, .. } => school_ids.contains(&school_id),
            Principal::SchoolStaff { school_id: own, .. } => *own == school_id,
            Principal::PlatformAdmin { .. } => true,
        }
    }

    /// Whether the caller may change settlement accounts and refund
    pub fn can_manage(&self, school_id: SchoolId) -> bool {
        match self {
            Principal::SchoolOwner { school_ids, .. } => school_ids.contains(&school_id),
            Principal::SchoolStaff { .. } => false,
            Principal::PlatformAdmin { .. } => true,
        }
    }

    pub fn require_view(&self, school_id: SchoolId) -> Result<(), AuthError> {
        if self.can_view(school_id) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!("no access to school {school_id}")))
        }
    }

    pub fn require_manage(&self, school_id: SchoolId) -> Result<(), AuthError> {
        if self.can_manage(school_id) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!(
                "only the school owner can do this for school {school_id}"
            )))
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub principal: Principal,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Creates a signed token for `principal`
pub fn create_token(
    principal: &Principal,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: principal.user_id().to_string(),
        principal: principal.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a token and returns its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

//! API middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::auth::{AuthError, Principal};
use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Validates the bearer token and stores its [`Principal`] in the request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("missing or invalid Authorization header");
            AuthError::MissingToken
        })?;

    let claims = crate::auth::validate_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = %e, "token validation failed");
        e
    })?;

    request.extensions_mut().insert(claims.principal);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every authenticated request with the acting principal.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let (user, role) = request
        .extensions()
        .get::<Principal>()
        .map(|p| (p.user_id().to_string(), role_name(p)))
        .unwrap_or_else(|| ("anonymous".to_string(), "none"));

    let start = Instant::now();
    let response = next.run(request).await;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user,
        role,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "API request"
    );

    response
}

fn role_name(principal: &Principal) -> &'static str {
    match principal {
        Principal::SchoolOwner { .. } => "school_owner",
        Principal::SchoolStaff { .. } => "school_staff",
        Principal::PlatformAdmin { .. } => "platform_admin",
    }
}

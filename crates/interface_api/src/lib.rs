//! HTTP API Layer
//!
//! REST surface of the school fee payment core, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: checkout, verification, payment queries, settlement
//!   accounts, the gateway webhook and health checks
//! - **Middleware**: JWT authentication into a [`auth::Principal`], audit logging
//! - **DTOs**: request and response bodies with validation
//! - **Error Handling**: domain errors mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, Ports};
//!
//! let state = AppState::new(config, ports);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_payments::{
    AccountService, AccountStore, PaymentGateway, PaymentService, PaymentStore, SchoolDirectory,
    WebhookVerifier,
};

use crate::config::ApiConfig;
use crate::handlers::{accounts, health, payments, webhooks};
use crate::middleware::{audit_middleware, auth_middleware};

/// Port implementations the API is wired to
#[derive(Clone)]
pub struct Ports {
    pub directory: Arc<dyn SchoolDirectory>,
    pub payments: Arc<dyn PaymentStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub gateway: Arc<dyn PaymentGateway>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub payments: PaymentService,
    pub accounts: AccountService,
    pub webhooks: WebhookVerifier,
    pub payment_store: Arc<dyn PaymentStore>,
    pub account_store: Arc<dyn AccountStore>,
}

impl AppState {
    pub fn new(config: ApiConfig, ports: Ports) -> Self {
        let payments = PaymentService::new(
            ports.directory.clone(),
            ports.payments.clone(),
            ports.accounts.clone(),
            ports.gateway.clone(),
        );
        let accounts = AccountService::new(ports.directory, ports.accounts.clone(), ports.gateway);
        let webhooks = WebhookVerifier::new(config.paystack_secret_key.clone());

        Self {
            config,
            payments,
            accounts,
            webhooks,
            payment_store: ports.payments,
            account_store: ports.accounts,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/webhooks/paystack", post(webhooks::paystack_webhook));

    // Payer-facing checkout routes
    let checkout_routes = Router::new()
        .route("/payments/initialize", post(payments::initialize_payment))
        .route("/payments/verify/:reference", get(payments::verify_payment))
        .route(
            "/schools/:school_id/fees/:fee_type_id/quote",
            get(payments::quote_fee),
        );

    // School-scoped routes
    let school_routes = Router::new()
        .route("/payments", get(payments::list_payments))
        .route("/payments/stats", get(payments::payment_stats))
        .route("/payments/manual", post(payments::record_manual_payment))
        .route("/payments/:id", get(payments::get_payment))
        .route("/payments/:id/refund", post(payments::refund_payment))
        .route(
            "/students/:student_id/payments",
            get(payments::student_payments),
        )
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::add_account),
        )
        .route("/accounts/:id/set-primary", patch(accounts::set_primary));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/schools/:school_id", school_routes)
        .route("/banks", get(accounts::list_banks))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", checkout_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

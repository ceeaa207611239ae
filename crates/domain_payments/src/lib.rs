//! Payments Domain - School Fee Collection
//!
//! This crate implements the payment core of the school fee platform:
//!
//! - **Fee Calculator** ([`fees`]): gateway surcharge and total payable
//! - **Settlement Routing** ([`settlement`]): the school's primary account
//!   and the gateway subaccount its funds settle to
//! - **Gateway Port** ([`gateway`]) and the Paystack adapter ([`adapters`])
//! - **Payment Lifecycle** ([`lifecycle`]): initialization and
//!   reconciliation of payments
//! - **Account Onboarding** ([`onboarding`]): verified settlement accounts
//!
//! # Payment States
//!
//! ```text
//! pending ──► successful ──► refunded
//!    │
//!    └──────► failed
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_payments::{PaymentService, InitializePaymentRequest};
//!
//! let checkout = service
//!     .initialize_payment(InitializePaymentRequest {
//!         school_id,
//!         student_id,
//!         fee_type_id,
//!         email: "parent@example.com".to_string(),
//!     })
//!     .await?;
//!
//! // later, from the callback or the webhook
//! let result = service.verify_payment(&checkout.reference).await?;
//! ```

pub mod account;
pub mod adapters;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod lifecycle;
pub mod onboarding;
pub mod payment;
pub mod ports;
pub mod reference;
pub mod settlement;
pub mod webhook;

pub use account::{BusinessAccount, NewBusinessAccount};
pub use adapters::{PaystackConfig, PaystackGateway};
pub use error::PaymentError;
pub use fees::{compute_transaction_fee, FeeBreakdown};
pub use gateway::{
    AccountResolution, Bank, Checkout, GatewayError, InitializeRequest, PaymentGateway,
    SubaccountRequest, TransactionStatus, Verification,
};
pub use lifecycle::{
    FeeQuote, InitializePaymentRequest, InitializedPayment, ManualPaymentRequest, PaymentService,
    VerificationOutcome, VerificationResult,
};
pub use onboarding::{AccountService, AddAccountRequest};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentStats, PaymentStatus, StatusTransition};
pub use ports::{AccountStore, FeeTypeRef, PaymentStore, SchoolDirectory, SchoolRef, StudentRef};
pub use settlement::{SettlementResolver, SettlementTarget};
pub use webhook::{WebhookError, WebhookEvent, WebhookVerifier};

#[cfg(any(test, feature = "mock"))]
pub use gateway::mock::RecordingGateway;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{InMemoryAccountStore, InMemoryDirectory, InMemoryPaymentStore};

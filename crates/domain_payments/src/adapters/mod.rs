//! External adapters for the payments domain
//!
//! - [`paystack`]: the Paystack implementation of [`PaymentGateway`](crate::gateway::PaymentGateway)

pub mod paystack;

pub use paystack::{PaystackConfig, PaystackGateway, DEFAULT_BASE_URL};

//! Request and response bodies

pub mod accounts;
pub mod payments;

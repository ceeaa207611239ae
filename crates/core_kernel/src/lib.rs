//! Core Kernel - Foundational types for the school fee payment platform
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money types with exact decimal arithmetic and a single minor-unit conversion
//! - Typed identifiers for tenants, students, fees and payments
//! - Port abstractions for the hexagonal architecture

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    SchoolId, UserId, StudentId, FeeTypeId, SessionId,
    PaymentId, BusinessAccountId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult,
    AdapterHealth,
};

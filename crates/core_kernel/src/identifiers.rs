//! Strongly-typed identifiers for domain entities
//!
//! Rows are keyed by surrogate integer ids. Newtype wrappers keep a school id
//! from being passed where a student id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw surrogate key
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw surrogate key
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

// Tenancy
define_id!(SchoolId, "SCH");
define_id!(UserId, "USR");

// Reference data owned by the school directory
define_id!(StudentId, "STU");
define_id!(FeeTypeId, "FEE");
define_id!(SessionId, "SES");

// Payments domain
define_id!(PaymentId, "PAY");
define_id!(BusinessAccountId, "BAC");

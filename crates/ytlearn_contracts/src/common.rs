#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Identifier prefix that no stored record may carry.
pub const RESERVED_ID_PREFIX: &str = "fox";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnixTimeMs(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },
    NotFinite {
        field: &'static str,
    },
}

impl std::fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => write!(f, "{field}: {reason}"),
            Self::InvalidRange {
                field,
                min,
                max,
                got,
            } => write!(f, "{field}: {got} is outside {min}..={max}"),
            Self::NotFinite { field } => write!(f, "{field}: must be finite"),
        }
    }
}

impl std::error::Error for ContractViolation {}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Anything that may carry a record identifier.
pub trait Identifiable {
    fn record_id(&self) -> Option<&str>;

    fn has_reserved_id(&self) -> bool {
        self.record_id().is_some_and(is_reserved_id)
    }
}

impl Identifiable for serde_json::Value {
    fn record_id(&self) -> Option<&str> {
        self.as_object()
            .and_then(|obj| obj.get("id"))
            .and_then(serde_json::Value::as_str)
    }
}

/// ASCII case-insensitive check against [`RESERVED_ID_PREFIX`].
pub fn is_reserved_id(id: &str) -> bool {
    let prefix = RESERVED_ID_PREFIX.as_bytes();
    id.len() >= prefix.len() && id.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#![forbid(unsafe_code)]

pub mod common;
pub mod content;
pub mod creation;
pub mod generation;
pub mod preferences;

pub use common::{
    is_reserved_id, ContractViolation, Identifiable, UnixTimeMs, Validate, RESERVED_ID_PREFIX,
};

#![forbid(unsafe_code)]

pub mod creation_cli;
pub mod logging;
pub mod vault_cli;

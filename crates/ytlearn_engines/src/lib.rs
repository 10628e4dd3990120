#![forbid(unsafe_code)]

pub mod ai_client;
pub mod device_vault;
pub mod normalizer;
pub mod prompts;
pub mod render;
mod render_assets;
pub mod thumbnail;

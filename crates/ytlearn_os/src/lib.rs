#![forbid(unsafe_code)]

pub mod generation;
pub mod playback;
pub mod seed;
pub mod source;

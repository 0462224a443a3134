// src/utils/mod.rs
//! Configuration and error types

pub mod config;
pub mod errors;

pub use config::RelayConfig;
pub use errors::{RelayError, Result};

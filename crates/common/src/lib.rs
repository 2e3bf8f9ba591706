//! djihud Common Utilities
//!
//! Shared infrastructure for all djihud crates:
//! - Error types, result aliases, and data-quality warnings
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;

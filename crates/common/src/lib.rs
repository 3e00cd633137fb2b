//! Wallcast Common Utilities
//!
//! Shared infrastructure for all Wallcast crates:
//! - Error types and result aliases
//! - Application configuration
//! - Wall-clock timestamp sources for journal output
//! - Tracing/logging initialization

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

//! Error types for the perf-fps crate.
//!
//! The monitor itself raises no runtime errors; it degrades gracefully
//! (floor latch, suspend, silent zero-frame guard). Everything fallible
//! lives at the configuration boundary.

use thiserror::Error;

/// Errors related to monitor configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Failed to read or write configuration: {0}")]
    Io(#[from] std::io::Error),
}

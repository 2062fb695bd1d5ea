//! Error types shared across RDR crates

use thiserror::Error;

/// Result type alias for RDR common operations
pub type Result<T> = std::result::Result<T, RdrError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum RdrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported digest '{0}': expected 32, 64 or 128 hex characters")]
    UnsupportedDigest(String),

    #[error("Invalid log configuration: {0}")]
    LogConfig(String),
}

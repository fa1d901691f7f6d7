//! Error types for surveyd
//!
//! Defines crate-level error types using thiserror for clear error
//! propagation. Rejected submissions are not errors in this sense: the
//! validator reports them as a plain list of messages and the API layer maps
//! them to a 400 response.

use thiserror::Error;

/// Convenience Result type using the surveyd Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for surveyd
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response store I/O error
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Response store (de)serialization error
    #[error("Storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

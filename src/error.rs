//! Error types for the statelet crate.
//!
//! Recoverable failures (persistence I/O, malformed files, bad configuration)
//! surface as [`StateletError`]. Programming-contract violations such as
//! using a learner before `init()` are assertions, not errors.

use thiserror::Error;

/// The main error type for statelet operations.
#[derive(Error, Debug)]
pub enum StateletError {
    /// Block has not been initialized before use
    #[error("Block not initialized - call init() before use")]
    NotInitialized,

    /// Array or input size does not match the expected geometry
    #[error("Invalid input size: expected {expected}, got {actual}")]
    InvalidInputSize {
        /// Expected size
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary (de)serialization error occurred
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON configuration error occurred
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// A specialized `Result` type for statelet operations.
pub type Result<T> = std::result::Result<T, StateletError>;

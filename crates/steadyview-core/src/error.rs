//! Error types for SteadyView.
//!
//! Only construction and configuration surfaces return these. The
//! estimation, smoothing and warp stages report degenerate input through
//! their return values instead.

use thiserror::Error;

/// Main error type for SteadyView operations.
#[derive(Error, Debug)]
pub enum StabilizeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for SteadyView operations.
pub type Result<T> = std::result::Result<T, StabilizeError>;

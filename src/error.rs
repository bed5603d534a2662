//! Error types for weft.
//!
//! Every failure the serializers can raise is represented by [`WeftError`].
//! The three domain variants mirror the three ways a request can be wrong:
//!
//! - [`WeftError::InvalidInput`]: the caller's data is structurally malformed
//!   (empty vector, `like` on a number, latitude out of range, ...).
//! - [`WeftError::Serialization`]: the expression is valid but cannot be written
//!   in the requested protocol (single-target reference filter in the textual
//!   protocol, reference-count filter in the textual protocol).
//! - [`WeftError::UnsupportedFeature`]: the expression is representable but the
//!   negotiated server version lacks the capability.
//!
//! All of them are raised while building the payload, before any network call.
//!
//! # Examples
//!
//! ```
//! use weft::error::{WeftError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(WeftError::invalid_input("vector cannot be empty"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    /// Malformed filter, search or vector arguments.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A valid expression that the requested protocol cannot represent.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A valid expression that the negotiated server version cannot accept.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary frame encoding/decoding errors
    #[error("Wire error: {0}")]
    Wire(#[from] bincode::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Internal failures (a worker task died, a channel closed early)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for operations that may fail with WeftError.
pub type Result<T> = std::result::Result<T, WeftError>;

impl WeftError {
    /// Create a new invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        WeftError::InvalidInput(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        WeftError::Serialization(msg.into())
    }

    /// Create a new unsupported feature error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        WeftError::UnsupportedFeature(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        WeftError::Internal(msg.into())
    }

    /// Whether the caller's own data was rejected.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, WeftError::InvalidInput(_))
    }

    /// Whether the requested protocol cannot represent the expression.
    pub fn is_serialization(&self) -> bool {
        matches!(self, WeftError::Serialization(_))
    }

    /// Whether the negotiated server version lacks a capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, WeftError::UnsupportedFeature(_))
    }
}

//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced definition does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authored content or a request failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence or I/O failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

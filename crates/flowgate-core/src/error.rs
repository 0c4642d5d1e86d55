//! Error types for Flowgate core.

use thiserror::Error;

/// Errors that can occur in core primitive operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Decoding error.
    #[error("decoding error: {0}")]
    DecodingError(String),
}

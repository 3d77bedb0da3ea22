//! Error types for the crypto crate.

use thiserror::Error;

/// Result type alias for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during crypto operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Empty or otherwise unusable key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Input could not be decoded
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

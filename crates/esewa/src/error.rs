//! Error types for the eSewa integration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for eSewa operations
pub type EsewaResult<T> = Result<T, EsewaError>;

/// Gateway configuration errors.
///
/// These are fatal: a process without a usable configuration must not
/// start accepting checkouts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// `ESEWA_ENV` names no known gateway environment
    #[error("Unknown eSewa environment '{0}' (expected test, uat or production)")]
    InvalidEnvironment(String),

    /// Secret key is empty
    #[error("eSewa secret key is empty")]
    MissingSecret,

    /// Merchant product code is empty
    #[error("eSewa product code is empty")]
    MissingProductCode,

    /// A configured URL is unusable
    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl {
        /// Configuration field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while building or signing outbound payments
#[derive(Error, Debug)]
pub enum EsewaError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Amount could not be parsed or overflowed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Transaction id contains characters the gateway rejects
    #[error("Invalid transaction uuid: {0}")]
    InvalidTransactionUuid(String),

    /// Signing primitive failed
    #[error("Signing failed: {0}")]
    Crypto(thriftly_crypto::CryptoError),
}

impl From<thriftly_crypto::CryptoError> for EsewaError {
    fn from(err: thriftly_crypto::CryptoError) -> Self {
        match err {
            thriftly_crypto::CryptoError::InvalidKey(_) => Self::Config(ConfigError::MissingSecret),
            other => Self::Crypto(other),
        }
    }
}

impl EsewaError {
    /// Create an invalid amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Check if this error should stop the process rather than one request
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

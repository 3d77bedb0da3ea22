//! HMAC-SHA256 signer keyed by the merchant secret.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::error::{ConfigError, EsewaResult};
use crate::message::SignedFields;

/// Base64 HMAC-SHA256 tag as exchanged with the gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Wrap a received signature
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow as str
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a received value
    #[must_use]
    pub fn matches(&self, received: &str) -> bool {
        thriftly_crypto::verify_signature(&self.0, received).is_ok()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sign `message` with `secret`.
///
/// # Errors
/// Returns a configuration error if `secret` is empty. An empty message is
/// signed normally.
pub fn sign_message(secret: &str, message: &str) -> EsewaResult<Signature> {
    let tag = thriftly_crypto::hmac_sha256_base64(secret.as_bytes(), message.as_bytes())?;
    Ok(Signature(tag))
}

/// Signs messages with the shared merchant secret.
///
/// Holds the secret for its whole life and never prints it.
pub struct Signer {
    secret: SecretString,
}

impl Signer {
    /// Create a signer.
    ///
    /// # Errors
    /// [`ConfigError::MissingSecret`] if the secret is empty.
    pub fn new(secret: SecretString) -> Result<Self, ConfigError> {
        if secret.expose_secret().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self { secret })
    }

    /// Create a signer from gateway configuration
    ///
    /// # Errors
    /// [`ConfigError::MissingSecret`] if the configured secret is empty.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        Self::new(SecretString::new(config.expose_secret_key().to_owned()))
    }

    /// Sign a raw message
    ///
    /// # Errors
    /// Only fails if the signing primitive rejects the key, which
    /// construction already rules out.
    pub fn sign(&self, message: &str) -> EsewaResult<Signature> {
        sign_message(self.secret.expose_secret(), message)
    }

    /// Sign the canonical message of `fields`
    ///
    /// # Errors
    /// See [`Signer::sign`].
    pub fn sign_fields(&self, fields: &SignedFields) -> EsewaResult<Signature> {
        self.sign(&fields.message())
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("secret", &"[REDACTED]").finish()
    }
}

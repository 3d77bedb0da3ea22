//! HMAC-SHA256 signing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compute the raw HMAC-SHA256 tag of `message` under `key`.
///
/// An empty key is rejected: HMAC itself accepts it, but a keyless tag
/// proves nothing about who produced it.
///
/// # Errors
/// Returns [`CryptoError::InvalidKey`] when `key` is empty.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32]> {
    if key.is_empty() {
        return Err(CryptoError::InvalidKey("key must not be empty".to_string()));
    }
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(message);
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Generate HMAC-SHA256 signature as standard, padded base64.
///
/// # Errors
/// Returns [`CryptoError::InvalidKey`] when `key` is empty.
pub fn hmac_sha256_base64(key: &[u8], message: &[u8]) -> Result<String> {
    hmac_sha256(key, message).map(|tag| crate::encode_base64(&tag))
}

/// Generate HMAC-SHA256 signature as lowercase hex.
///
/// # Errors
/// Returns [`CryptoError::InvalidKey`] when `key` is empty.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String> {
    hmac_sha256(key, message).map(hex::encode)
}

/// Verify a signature against an expected value.
///
/// Both sides are compared as encoded strings, in constant time.
///
/// # Errors
/// Returns [`CryptoError::SignatureMismatch`] if they differ.
pub fn verify_signature(signature: &str, expected: &str) -> Result<()> {
    if crate::constant_time_compare(signature.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(CryptoError::SignatureMismatch)
    }
}

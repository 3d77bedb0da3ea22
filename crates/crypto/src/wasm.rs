//! WASM bindings for the web storefront.

use wasm_bindgen::prelude::*;

/// Generate HMAC-SHA256 signature and return as base64 string.
///
/// Returns an empty string when the key is empty.
#[wasm_bindgen]
pub fn hmac_sha256_base64(key: &str, message: &str) -> String {
    crate::hmac_sha256_base64(key.as_bytes(), message.as_bytes()).unwrap_or_default()
}

/// Verify a base64 HMAC-SHA256 signature (constant-time comparison).
#[wasm_bindgen]
pub fn verify_hmac_sha256_base64(key: &str, message: &str, signature: &str) -> bool {
    match crate::hmac_sha256_base64(key.as_bytes(), message.as_bytes()) {
        Ok(expected) => crate::constant_time_compare(expected.as_bytes(), signature.as_bytes()),
        Err(_) => false,
    }
}

/// Constant-time comparison of two strings.
#[wasm_bindgen]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    crate::constant_time_compare(a.as_bytes(), b.as_bytes())
}

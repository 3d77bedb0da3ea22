//! Signing primitives for Thriftly payment integrations.
//!
//! This crate provides:
//! - HMAC-SHA256 tags as raw bytes, base64 or hex
//! - Lenient base64 decoding for values that travelled through query strings
//! - Constant-time comparison for security

#![warn(missing_docs)]

mod encoding;
mod error;
mod hmac_impl;
mod timing;

#[cfg(feature = "wasm")]
mod wasm;

pub use encoding::{decode_base64_lenient, encode_base64};
pub use error::{CryptoError, Result};
pub use hmac_impl::{hmac_sha256, hmac_sha256_base64, hmac_sha256_hex, verify_signature};
pub use timing::constant_time_compare;

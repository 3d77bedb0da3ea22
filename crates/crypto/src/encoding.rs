//! Base64 helpers.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::{CryptoError, Result};

/// Encode bytes as standard, padded base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 that may have been rewritten in transit.
///
/// Tries the standard alphabet first, then the URL-safe one, each with and
/// without padding. Surrounding whitespace is ignored.
///
/// # Errors
/// Returns [`CryptoError::EncodingError`] when no variant accepts the input.
pub fn decode_base64_lenient(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    let mut last_error = None;
    for engine in [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD] {
        match engine.decode(input) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => last_error = Some(e),
        }
    }
    Err(CryptoError::EncodingError(
        last_error.map_or_else(|| "empty input".to_string(), |e| e.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_standard() {
        assert_eq!(decode_base64_lenient("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_without_padding() {
        assert_eq!(decode_base64_lenient("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_url_safe() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        assert_eq!(decode_base64_lenient("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64_lenient("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode_base64_lenient("  aGVsbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_base64_lenient("not base64!!"),
            Err(CryptoError::EncodingError(_))
        ));
    }
}

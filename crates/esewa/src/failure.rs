//! Callback failure taxonomy
//!
//! Every rejected callback maps to exactly one variant with a stable code,
//! so callers can choose user-facing messages and whether to mark the order
//! failed. None of these are retried.

use serde::Serialize;
use thiserror::Error;

/// Why a gateway callback was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum CallbackFailure {
    /// No envelope was supplied
    #[error("Payment data missing from callback")]
    MissingData,

    /// Envelope is not base64 JSON, or a declared field is unusable
    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    /// `signature` or `signed_field_names` absent
    #[error("Callback is missing its signature")]
    MissingSignature,

    /// Recomputed signature differs from the received one
    #[error("Invalid signature")]
    InvalidSignature,

    /// Unexpected failure while verifying
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Caller-side failure after a successful verification
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// Buyer cancelled at the gateway
    #[error("Payment cancelled by user")]
    UserCancelled,
}

impl CallbackFailure {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingData => "missing_data",
            Self::InvalidData(_) => "invalid_data",
            Self::MissingSignature => "missing_signature",
            Self::InvalidSignature => "invalid_signature",
            Self::VerificationFailed(_) => "verification_failed",
            Self::ProcessingError(_) => "processing_error",
            Self::UserCancelled => "user_cancelled",
        }
    }

    /// Message suitable for showing the buyer
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingData | Self::InvalidData(_) => {
                "We could not read the payment response. Please contact support if you were charged."
            }
            Self::MissingSignature | Self::InvalidSignature => {
                "Payment verification failed for security reasons."
            }
            Self::VerificationFailed(_) | Self::ProcessingError(_) => {
                "Something went wrong while confirming your payment. Please try again."
            }
            Self::UserCancelled => "Payment was cancelled.",
        }
    }

    /// True when the failure suggests tampering and should be monitored
    #[must_use]
    pub fn is_fraud_signal(&self) -> bool {
        matches!(self, Self::InvalidSignature)
    }

    /// Create a processing error for caller-side failures
    pub fn processing(msg: impl Into<String>) -> Self {
        Self::ProcessingError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let cases = [
            (CallbackFailure::MissingData, "missing_data"),
            (CallbackFailure::InvalidData("x".into()), "invalid_data"),
            (CallbackFailure::MissingSignature, "missing_signature"),
            (CallbackFailure::InvalidSignature, "invalid_signature"),
            (CallbackFailure::VerificationFailed("x".into()), "verification_failed"),
            (CallbackFailure::processing("db down"), "processing_error"),
            (CallbackFailure::UserCancelled, "user_cancelled"),
        ];
        for (failure, code) in cases {
            assert_eq!(failure.code(), code);
        }
    }

    #[test]
    fn test_serialized_code_matches() {
        let json = serde_json::to_value(CallbackFailure::InvalidSignature).unwrap();
        assert_eq!(json["code"], "invalid_signature");
        let json = serde_json::to_value(CallbackFailure::InvalidData("bad json".into())).unwrap();
        assert_eq!(json["code"], "invalid_data");
        assert_eq!(json["detail"], "bad json");
    }

    #[test]
    fn test_only_signature_mismatch_is_fraud_signal() {
        assert!(CallbackFailure::InvalidSignature.is_fraud_signal());
        assert!(!CallbackFailure::MissingSignature.is_fraud_signal());
        assert_eq!(
            CallbackFailure::InvalidSignature.user_message(),
            "Payment verification failed for security reasons."
        );
    }
}

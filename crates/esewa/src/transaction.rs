//! Per-attempt transaction identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EsewaError;

/// Correlation id for one payment attempt.
///
/// Embedded in the signed message, so a signature is bound to exactly one
/// attempt. Never reuse a value across attempts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionUuid(String);

impl TransactionUuid {
    /// Generate a fresh id (UUID v4, hyphenated)
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept an id recorded elsewhere.
    ///
    /// The gateway only accepts ASCII alphanumerics and hyphens.
    ///
    /// # Errors
    /// Returns [`EsewaError::InvalidTransactionUuid`] for empty input or
    /// other characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, EsewaError> {
        let value = value.into();
        if value.is_empty()
            || !value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(EsewaError::InvalidTransactionUuid(value));
        }
        Ok(Self(value))
    }

    /// Borrow as str
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TransactionUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

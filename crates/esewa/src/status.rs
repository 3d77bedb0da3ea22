//! Gateway transaction states and status-check requests.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::amount::Amount;
use crate::error::ConfigError;
use crate::transaction::TransactionUuid;

/// Transaction state reported by eSewa
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Paid
    Complete,
    /// Initiated, not completed
    Pending,
    /// Refunded in full
    FullRefund,
    /// Refunded in part
    PartialRefund,
    /// Stuck in a halt state at the gateway
    Ambiguous,
    /// Unknown to the gateway, or the session expired
    NotFound,
    /// Cancelled or reversed
    Canceled,
    /// Anything else, kept verbatim
    Unknown(String),
}

impl TransactionStatus {
    /// Parse the gateway's status string
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "COMPLETE" => Self::Complete,
            "PENDING" => Self::Pending,
            "FULL_REFUND" => Self::FullRefund,
            "PARTIAL_REFUND" => Self::PartialRefund,
            "AMBIGUOUS" => Self::Ambiguous,
            "NOT_FOUND" => Self::NotFound,
            "CANCELED" | "CANCELLED" => Self::Canceled,
            _ => Self::Unknown(value.to_string()),
        }
    }

    /// The gateway's spelling
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Complete => "COMPLETE",
            Self::Pending => "PENDING",
            Self::FullRefund => "FULL_REFUND",
            Self::PartialRefund => "PARTIAL_REFUND",
            Self::Ambiguous => "AMBIGUOUS",
            Self::NotFound => "NOT_FOUND",
            Self::Canceled => "CANCELED",
            Self::Unknown(s) => s,
        }
    }

    /// Only a complete transaction may fulfil an order
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Parameters of a status-check lookup
#[derive(Debug, Clone)]
pub struct StatusQuery {
    /// Merchant product code
    pub product_code: String,
    /// Amount recorded for the attempt
    pub total_amount: Amount,
    /// Attempt id
    pub transaction_uuid: TransactionUuid,
}

impl StatusQuery {
    /// Build the lookup URL against `status_url`
    ///
    /// # Errors
    /// [`ConfigError::InvalidUrl`] if `status_url` does not parse.
    pub fn url(&self, status_url: &str) -> Result<Url, ConfigError> {
        let total = self.total_amount.to_string();
        Url::parse_with_params(
            status_url,
            [
                ("product_code", self.product_code.as_str()),
                ("total_amount", total.as_str()),
                ("transaction_uuid", self.transaction_uuid.as_str()),
            ],
        )
        .map_err(|_| ConfigError::InvalidUrl {
            field: "status_url",
            value: status_url.to_string(),
        })
    }
}

/// Status-check response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusResponse {
    /// Merchant product code
    pub product_code: String,
    /// Attempt id
    pub transaction_uuid: String,
    /// Amount as reported by the gateway
    pub total_amount: serde_json::Value,
    /// Transaction state
    pub status: TransactionStatus,
    /// Gateway reference, absent until complete
    #[serde(default)]
    pub ref_id: Option<String>,
}

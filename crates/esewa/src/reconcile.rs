//! Order reconciliation.
//!
//! A valid signature proves the gateway sent the callback, not that it is
//! about this order or this amount. Check both against what was recorded at
//! initiation before fulfilling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::Amount;
use crate::callback::VerifiedCallback;
use crate::status::TransactionStatus;
use crate::transaction::TransactionUuid;

/// What the merchant recorded when the payment was initiated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedOrder {
    /// Attempt id from [`crate::PaymentForm::transaction_uuid`]
    pub transaction_uuid: TransactionUuid,
    /// Amount in paisa from [`crate::PaymentForm::total_amount`]
    pub total_amount_paisa: u64,
}

impl ExpectedOrder {
    /// Record an expected order
    #[must_use]
    pub fn new(transaction_uuid: TransactionUuid, total_amount: Amount) -> Self {
        Self {
            transaction_uuid,
            total_amount_paisa: total_amount.paisa(),
        }
    }

    /// Expected amount
    #[must_use]
    pub fn total_amount(&self) -> Amount {
        Amount::from_paisa(self.total_amount_paisa)
    }
}

/// Why an authentic callback does not settle the order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A field needed for the check was not signed
    #[error("Callback did not sign '{0}'")]
    MissingField(&'static str),

    /// Callback is for another attempt
    #[error("Transaction mismatch: expected {expected}, got {actual}")]
    TransactionMismatch {
        /// Recorded id
        expected: String,
        /// Id in the callback
        actual: String,
    },

    /// Callback amount differs from the recorded amount
    #[error("Amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch {
        /// Recorded amount
        expected: String,
        /// Amount in the callback
        actual: String,
    },

    /// Gateway says the payment is not complete
    #[error("Payment not complete: {0}")]
    NotComplete(TransactionStatus),
}

impl VerifiedCallback {
    /// Check this callback settles `expected`.
    ///
    /// # Errors
    /// The first [`ReconcileError`] found.
    pub fn reconcile(&self, expected: &ExpectedOrder) -> Result<(), ReconcileError> {
        let uuid = self
            .transaction_uuid()
            .ok_or(ReconcileError::MissingField("transaction_uuid"))?;
        if uuid != expected.transaction_uuid.as_str() {
            return Err(ReconcileError::TransactionMismatch {
                expected: expected.transaction_uuid.to_string(),
                actual: uuid.to_string(),
            });
        }

        let raw_amount = self
            .total_amount()
            .ok_or(ReconcileError::MissingField("total_amount"))?;
        let amount_matches = Amount::parse_lenient(raw_amount)
            .map(|a| a == expected.total_amount())
            .unwrap_or(false);
        if !amount_matches {
            return Err(ReconcileError::AmountMismatch {
                expected: expected.total_amount().to_string(),
                actual: raw_amount.to_string(),
            });
        }

        let status = self.status().ok_or(ReconcileError::MissingField("status"))?;
        if !status.is_complete() {
            return Err(ReconcileError::NotComplete(status));
        }

        tracing::debug!(transaction_uuid = uuid, "eSewa callback reconciled");
        Ok(())
    }
}

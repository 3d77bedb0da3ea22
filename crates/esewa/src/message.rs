//! Canonical message construction.
//!
//! The gateway signs `name1=value1,name2=value2,...` over the fields it
//! names, in the order it names them. Both sides must produce the same bytes,
//! so nothing here trims, sorts or escapes.

use crate::amount::Amount;
use crate::transaction::TransactionUuid;

/// Field order signed on outbound payment requests
pub const OUTBOUND_SIGNED_FIELDS: [&str; 3] = ["total_amount", "transaction_uuid", "product_code"];

/// Ordered `(name, value)` pairs that make up a signed message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedFields {
    fields: Vec<(String, String)>,
}

impl SignedFields {
    /// Create an empty field list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The three fields signed when initiating a purchase
    #[must_use]
    pub fn outbound(
        total_amount: Amount,
        transaction_uuid: &TransactionUuid,
        product_code: &str,
    ) -> Self {
        Self::new()
            .with(OUTBOUND_SIGNED_FIELDS[0], total_amount.to_string())
            .with(OUTBOUND_SIGNED_FIELDS[1], transaction_uuid.as_str())
            .with(OUTBOUND_SIGNED_FIELDS[2], product_code)
    }

    /// Append a field
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Builder-style append
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Render the message to sign
    #[must_use]
    pub fn message(&self) -> String {
        let mut out = String::new();
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        out
    }

    /// Render the `signed_field_names` value for these fields
    #[must_use]
    pub fn field_names(&self) -> String {
        self.fields
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Iterate fields in signing order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Value of the first field called `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields were added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for SignedFields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.push(name, value);
        }
        fields
    }
}

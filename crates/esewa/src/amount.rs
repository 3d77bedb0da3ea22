//! Rupee amounts in integer paisa.
//!
//! The signed message carries the amount as text, so the text must be
//! identical to what is posted to the gateway. Holding amounts as paisa and
//! rendering with a fixed two decimals keeps that true.

use std::fmt;
use std::str::FromStr;

use crate::error::EsewaError;

/// A non-negative amount in paisa (1/100 rupee)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Zero rupees
    pub const ZERO: Self = Self(0);

    /// Create from paisa
    #[must_use]
    pub const fn from_paisa(paisa: u64) -> Self {
        Self(paisa)
    }

    /// Create from whole rupees
    ///
    /// # Errors
    /// Fails if the value does not fit in paisa.
    pub fn from_rupees(rupees: u64) -> Result<Self, EsewaError> {
        rupees
            .checked_mul(100)
            .map(Self)
            .ok_or_else(|| EsewaError::invalid_amount(format!("{rupees} rupees overflows")))
    }

    /// Value in paisa
    #[must_use]
    pub const fn paisa(self) -> u64 {
        self.0
    }

    /// Checked addition
    ///
    /// # Errors
    /// Fails on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, EsewaError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| EsewaError::invalid_amount("sum overflows"))
    }

    /// Parse an amount as echoed back by the gateway.
    ///
    /// Same as [`FromStr`] but tolerates thousands separators (`1,000.0`).
    ///
    /// # Errors
    /// Fails on anything that is not a non-negative decimal with at most
    /// two fractional digits.
    pub fn parse_lenient(s: &str) -> Result<Self, EsewaError> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, Some(frac)),
            None => (s, None),
        };
        if !whole.contains(',') {
            return s.parse();
        }

        let mut groups = whole.split(',');
        let lead = groups.next().unwrap_or_default();
        let grouped = (1..=3).contains(&lead.len())
            && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()));
        if !grouped {
            return Err(EsewaError::invalid_amount(format!(
                "'{s}' has misplaced thousands separators"
            )));
        }

        let whole = whole.replace(',', "");
        match frac {
            Some(frac) => format!("{whole}.{frac}").parse(),
            None => whole.parse(),
        }
    }
}

impl FromStr for Amount {
    type Err = EsewaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || EsewaError::invalid_amount(format!("'{s}' is not a valid amount"));

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let rupees: u64 = whole.parse().map_err(|_| invalid())?;
        let paisa: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paisa))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

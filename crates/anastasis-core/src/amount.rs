//! TALER amount encoding: `{ currency, value, fraction }` with fraction in
//! units of `1e-8` of the currency, per the GLOSSARY.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnastasisError;

/// Fractional units per whole currency unit (`1/10^8`).
pub const FRACTION_BASE: u32 = 100_000_000;

/// `{ currency, value, fraction }` amount, matching the wire format used
/// by payment records and challenge-payment accounting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// ISO-4217-ish currency code, at most 12 bytes per spec.md §6.
    pub currency: String,
    pub value: u64,
    pub fraction: u32,
}

impl Amount {
    pub fn new(currency: impl Into<String>, value: u64, fraction: u32) -> Self {
        let mut a = Amount { currency: currency.into(), value, fraction };
        a.normalize();
        a
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Amount { currency: currency.into(), value: 0, fraction: 0 }
    }

    fn normalize(&mut self) {
        if self.fraction >= FRACTION_BASE {
            self.value += (self.fraction / FRACTION_BASE) as u64;
            self.fraction %= FRACTION_BASE;
        }
    }

    /// Compare two amounts of the same currency. Returns `None` if the
    /// currencies differ (callers must convert/normalize out-of-band; the
    /// store never compares cross-currency amounts itself).
    pub fn checked_cmp(&self, other: &Amount) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some((self.value, self.fraction).cmp(&(other.value, other.fraction)))
    }

    /// True iff `self >= other` in the same currency. Used by the IBAN
    /// plugin to decide whether a transferred amount satisfies the
    /// expected challenge cost (spec.md §9, REDESIGN FLAGS).
    pub fn at_least(&self, other: &Amount) -> bool {
        matches!(
            self.checked_cmp(other),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0 && self.fraction == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fraction == 0 {
            write!(f, "{}:{}", self.currency, self.value)
        } else {
            write!(f, "{}:{}.{:08}", self.currency, self.value, self.fraction)
        }
    }
}

impl FromStr for Amount {
    type Err = AnastasisError;

    /// Parses the `CURRENCY:VALUE[.FRACTION]` form produced by `Display`,
    /// e.g. `"EUR:1"` or `"EUR:1.5"` — used to read the `COST` key out of
    /// configuration (spec.md §6).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (currency, rest) = s
            .split_once(':')
            .ok_or_else(|| AnastasisError::Config(format!("malformed amount {s:?}, expected CURRENCY:VALUE")))?;
        let (value_str, fraction_str) = rest.split_once('.').unwrap_or((rest, ""));
        let value: u64 = value_str
            .parse()
            .map_err(|_| AnastasisError::Config(format!("malformed amount value in {s:?}")))?;
        let fraction = if fraction_str.is_empty() {
            0
        } else {
            let digits = format!("{:0<8}", fraction_str);
            digits[..8]
                .parse::<u32>()
                .map_err(|_| AnastasisError::Config(format!("malformed amount fraction in {s:?}")))?
        };
        Ok(Amount::new(currency, value, fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_display_form_back() {
        assert_eq!(Amount::from_str("EUR:1").unwrap(), Amount::new("EUR", 1, 0));
        assert_eq!(Amount::from_str("EUR:1.5").unwrap(), Amount::new("EUR", 1, 50_000_000));
        assert!(Amount::from_str("garbage").is_err());
    }

    #[test]
    fn normalizes_overflowing_fraction() {
        let a = Amount::new("EUR", 1, FRACTION_BASE + 5);
        assert_eq!(a.value, 2);
        assert_eq!(a.fraction, 5);
    }

    #[test]
    fn at_least_rejects_insufficient() {
        let expected = Amount::new("EUR", 10, 0);
        let observed = Amount::new("EUR", 9, 0);
        assert!(!observed.at_least(&expected));
    }

    #[test]
    fn at_least_accepts_sufficient_and_exact() {
        let expected = Amount::new("EUR", 10, 0);
        assert!(Amount::new("EUR", 10, 0).at_least(&expected));
        assert!(Amount::new("EUR", 11, 0).at_least(&expected));
    }

    #[test]
    fn cross_currency_is_incomparable() {
        let a = Amount::new("EUR", 1, 0);
        let b = Amount::new("USD", 1, 0);
        assert_eq!(a.checked_cmp(&b), None);
    }
}

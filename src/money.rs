//! Money Conversion Module
//!
//! Fixed-point representation of currency amounts. All conversions between the
//! client-facing string form and the internal integer form MUST go through
//! this module.
//!
//! ## Internal Representation
//! - Amounts are stored as `i64` micro-units (scale factor `10^6`)
//! - An [`Amount`] is never negative; balances inherit that invariant
//! - All arithmetic is overflow-checked, there is no silent wrapping
//!
//! ## Usage
//! ```rust
//! use tcc_ledger::money::{parse_amount, Amount};
//!
//! // Client sends "1.5"
//! let internal = parse_amount("1.5").unwrap();
//! assert_eq!(internal.scaled(), 1_500_000);
//!
//! // Display balance to client
//! assert_eq!(internal.format(), "1.500000");
//! ```

use std::fmt;
use std::num::IntErrorKind;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits carried by an [`Amount`].
pub const AMOUNT_DECIMALS: u32 = 6;

/// Scale factor between display units and internal units.
pub const AMOUNT_SCALE: i64 = 1_000_000;

// ============================================================================
// Error Types
// ============================================================================

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount cannot be negative")]
    Negative,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Amount
// ============================================================================

/// Non-negative fixed-point amount in micro-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Wrap an already-scaled value (e.g. read back from storage).
    pub fn from_scaled(value: i64) -> Result<Self, MoneyError> {
        if value < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(value))
    }

    /// Whole units, for tests and fixtures.
    pub fn from_units(units: i64) -> Result<Self, MoneyError> {
        units
            .checked_mul(AMOUNT_SCALE)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::from_scaled)
    }

    /// Raw scaled value
    #[inline]
    pub fn scaled(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or(MoneyError::Overflow)
    }

    /// Subtract, failing with `Negative` when `rhs > self`.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, MoneyError> {
        if rhs.0 > self.0 {
            return Err(MoneyError::Negative);
        }
        Ok(Amount(self.0 - rhs.0))
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, AMOUNT_DECIMALS)
    }

    /// Full precision display string, always 6 fractional digits.
    pub fn format(&self) -> String {
        format!(
            "{:.prec$}",
            self.to_decimal(),
            prec = AMOUNT_DECIMALS as usize
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_amount(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Parse: Client → Internal (String → Amount)
// ============================================================================

/// Convert a client string amount to an internal [`Amount`]
///
/// # Errors
/// * `PrecisionOverflow` - more than 6 fractional digits (no silent truncation)
/// * `Negative` - leading minus sign
/// * `Overflow` - result does not fit in `i64` micro-units
/// * `InvalidFormat` - anything that is not `digits[.digits]`
pub fn parse_amount(amount_str: &str) -> Result<Amount, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') {
        return Err(MoneyError::Negative);
    }

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            // Require both sides of the dot: ".5" and "5." are ambiguous
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple decimal points".into())),
    };

    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in whole part: {}",
            whole
        )));
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in fractional part: {}",
            frac
        )));
    }

    if frac.len() > AMOUNT_DECIMALS as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: AMOUNT_DECIMALS,
        });
    }

    let whole_num: i64 = whole.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => MoneyError::Overflow,
        _ => MoneyError::InvalidFormat(format!("invalid whole part: {}", whole)),
    })?;

    let frac_num: i64 = if frac.is_empty() {
        0
    } else {
        let frac_padded = format!("{:0<width$}", frac, width = AMOUNT_DECIMALS as usize);
        frac_padded
            .parse::<i64>()
            .map_err(|_| MoneyError::InvalidFormat("invalid fractional part".into()))?
    };

    let scaled = whole_num
        .checked_mul(AMOUNT_SCALE)
        .and_then(|v| v.checked_add(frac_num))
        .ok_or(MoneyError::Overflow)?;

    Amount::from_scaled(scaled)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_variations() {
        assert_eq!(parse_amount("1").unwrap().scaled(), 1_000_000);
        assert_eq!(parse_amount("1.5").unwrap().scaled(), 1_500_000);
        assert_eq!(parse_amount("0.000001").unwrap().scaled(), 1);
        assert_eq!(parse_amount(" 100.25 ").unwrap().scaled(), 100_250_000);
        assert_eq!(parse_amount("007.10").unwrap().scaled(), 7_100_000);

        // Zero is a valid (non-negative) amount
        assert!(parse_amount("0").unwrap().is_zero());
        assert!(parse_amount("0.000000").unwrap().is_zero());
    }

    #[test]
    fn test_parse_amount_invalid_formats() {
        let cases = [
            "",         // Empty
            "1,000.00", // Commas not allowed
            "1.2.3",    // Multiple dots
            "1. 23",    // Spaces inside
            "+1.23",    // Explicit plus rejected
            "1e2",      // Scientific notation rejected
            "0x12",     // Hex rejected
            ".",        // Just a dot
            ".5",       // Missing leading zero
            "5.",       // Missing fractional part
            "abc",
        ];
        for case in cases {
            assert!(
                matches!(parse_amount(case), Err(MoneyError::InvalidFormat(_))),
                "Should reject invalid format: {:?}",
                case
            );
        }
    }

    #[test]
    fn test_parse_amount_negative() {
        assert_eq!(parse_amount("-1"), Err(MoneyError::Negative));
        assert_eq!(parse_amount("-0.5"), Err(MoneyError::Negative));
    }

    #[test]
    fn test_parse_amount_precision_limit() {
        assert!(parse_amount("1.123456").is_ok());
        assert_eq!(
            parse_amount("1.1234567"),
            Err(MoneyError::PrecisionOverflow {
                provided: 7,
                max: 6
            })
        );
    }

    #[test]
    fn test_parse_amount_i64_boundary() {
        // i64::MAX = 9_223_372_036_854_775_807 micro-units
        let max = "9223372036854.775807";
        assert_eq!(parse_amount(max).unwrap().scaled(), i64::MAX);

        assert_eq!(parse_amount("9223372036854.775808"), Err(MoneyError::Overflow));
        assert_eq!(parse_amount("99999999999999999999"), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_format() {
        assert_eq!(Amount::from_scaled(1_500_000).unwrap().format(), "1.500000");
        assert_eq!(Amount::ZERO.format(), "0.000000");
        assert_eq!(Amount::from_scaled(1).unwrap().format(), "0.000001");
        assert_eq!(
            Amount::from_scaled(i64::MAX).unwrap().format(),
            "9223372036854.775807"
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_units(100).unwrap();
        let b = Amount::from_units(40).unwrap();

        assert_eq!(a.checked_sub(b).unwrap(), Amount::from_units(60).unwrap());
        assert_eq!(b.checked_sub(a), Err(MoneyError::Negative));
        assert_eq!(a.checked_sub(a).unwrap(), Amount::ZERO);

        let max = Amount::from_scaled(i64::MAX).unwrap();
        assert_eq!(max.checked_add(Amount::from_scaled(1).unwrap()), Err(MoneyError::Overflow));
        assert_eq!(a.checked_add(b).unwrap(), Amount::from_units(140).unwrap());
    }

    #[test]
    fn test_from_scaled_rejects_negative() {
        assert_eq!(Amount::from_scaled(-1), Err(MoneyError::Negative));
        assert_eq!(Amount::from_units(i64::MAX), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_serde_as_string() {
        let amount = parse_amount("12.34").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"12.340000\"");
        let back: Amount = serde_json::from_str("\"12.34\"").unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
    }
}

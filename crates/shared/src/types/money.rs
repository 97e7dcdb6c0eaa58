//! Currency codes and the decimal scale of amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` throughout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places carried by fiat amounts.
pub const FIAT_SCALE: u32 = 2;

/// Returns true if `amount` needs no more than `scale` decimal places.
///
/// Trailing zeros do not count, so `10.500` fits a scale of 2.
#[must_use]
pub fn fits_scale(amount: Decimal, scale: u32) -> bool {
    amount.normalize().scale() <= scale
}

/// Error returned when parsing a currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: {0:?}")]
pub struct InvalidCurrencyCode(pub String);

/// ISO 4217 style three letter currency code (e.g. "GHS", "USD").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses a currency code, normalizing it to upper case.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, InvalidCurrencyCode> {
        let trimmed = code.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(code.to_string()))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn ghs() -> CurrencyCode {
        CurrencyCode::parse("GHS").unwrap()
    }

    #[rstest]
    #[case("GHS", "GHS")]
    #[case("usd", "USD")]
    #[case(" eur ", "EUR")]
    fn test_currency_code_parse(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(CurrencyCode::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("GH")]
    #[case("GHSS")]
    #[case("G1S")]
    fn test_currency_code_rejects(#[case] input: &str) {
        assert!(CurrencyCode::parse(input).is_err());
    }

    #[test]
    fn test_currency_code_serde() {
        let json = serde_json::to_string(&ghs()).unwrap();
        assert_eq!(json, "\"GHS\"");
        let parsed: CurrencyCode = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(parsed.as_str(), "USD");
        assert!(serde_json::from_str::<CurrencyCode>("\"dollars\"").is_err());
    }

    #[rstest]
    #[case(dec!(10), true)]
    #[case(dec!(10.5), true)]
    #[case(dec!(10.55), true)]
    #[case(dec!(10.500), true)]
    #[case(dec!(10.555), false)]
    #[case(dec!(0.001), false)]
    fn test_fits_fiat_scale(#[case] amount: Decimal, #[case] expected: bool) {
        assert_eq!(fits_scale(amount, FIAT_SCALE), expected);
    }
}

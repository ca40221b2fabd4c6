//! Request parameter validation for currency codes and amounts

use serde::{Serialize, Serializer};
use std::fmt::Display;

use super::error::RateError;

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A three letter ISO-4217 style code such as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validates `raw` as the value of the query parameter `field`.
    ///
    /// Only exactly three uppercase ASCII letters are accepted; the input is
    /// never trimmed or upper-cased.
    pub fn parse(field: &str, raw: &str) -> Result<Self, RateError> {
        if raw.len() == 3 && raw.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(CurrencyCode(raw.to_string()))
        } else {
            Err(RateError::invalid(format!(
                "Invalid currency code for '{field}': expected three uppercase letters (e.g. USD)"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A strictly positive, finite amount of money.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    pub fn parse(raw: &str) -> Result<Self, RateError> {
        let value: f64 = raw
            .parse()
            .map_err(|_| RateError::invalid("Invalid amount: must be a number"))?;

        if !value.is_finite() {
            return Err(RateError::invalid("Invalid amount: must be a finite number"));
        }
        if value <= 0.0 {
            return Err(RateError::invalid(
                "Invalid amount: must be greater than zero",
            ));
        }
        Ok(Amount(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    fn as_whole(&self) -> Option<u64> {
        (self.0.fract() == 0.0 && self.0 <= MAX_EXACT_INTEGER).then_some(self.0 as u64)
    }
}

// Always the same text as the serialised JSON number.
impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.as_whole(), serde_json::Number::from_f64(self.0)) {
            (Some(whole), _) => write!(f, "{whole}"),
            (None, Some(number)) => write!(f, "{number}"),
            (None, None) => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_whole() {
            Some(whole) => serializer.serialize_u64(whole),
            None => serializer.serialize_f64(self.0),
        }
    }
}

//! Exchange rate types and the upstream provider abstraction

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

use super::currency::{Amount, CurrencyCode};
use super::error::RateError;

/// Credential for the upstream provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input so an empty variable counts as unset.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| ApiKey(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Rates relative to `base`, exactly as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSet {
    pub base: String,
    pub conversion_rates: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairQuote {
    pub converted: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: Amount,
    pub converted: f64,
    pub rate: f64,
}

impl ConversionResult {
    pub fn new(from: CurrencyCode, to: CurrencyCode, amount: Amount, quote: PairQuote) -> Self {
        ConversionResult {
            from,
            to,
            amount,
            converted: quote.converted,
            rate: quote.rate,
        }
    }
}

#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn latest(&self, key: &ApiKey, base: &CurrencyCode) -> Result<RateSet, RateError>;

    async fn pair(
        &self,
        key: &ApiKey,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: Amount,
    ) -> Result<PairQuote, RateError>;
}

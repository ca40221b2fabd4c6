//! Validation and proxy pipeline behind the `/rates` and `/convert` endpoints.
//!
//! Both operations run `validate -> check config -> call -> shape`, stopping
//! at the first failure. There is a single upstream attempt per request.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::{
    Amount, ApiKey, ConversionResult, CurrencyCode, ExchangeRateProvider, RateError, RateSet,
};

pub const DEFAULT_BASE: &str = "USD";
pub const DEFAULT_FROM: &str = "USD";
pub const DEFAULT_TO: &str = "EUR";
pub const DEFAULT_AMOUNT: &str = "1";

pub struct RateService {
    api_key: Option<ApiKey>,
    provider: Arc<dyn ExchangeRateProvider>,
}

impl RateService {
    pub fn new(api_key: Option<ApiKey>, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        RateService { api_key, provider }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&ApiKey, RateError> {
        self.api_key.as_ref().ok_or(RateError::NotConfigured)
    }

    #[instrument(skip(self))]
    pub async fn get_rates(&self, base: Option<&str>) -> Result<RateSet, RateError> {
        let base = CurrencyCode::parse("base", base.unwrap_or(DEFAULT_BASE))?;
        let key = self.api_key()?;

        let rates = self.provider.latest(key, &base).await?;
        debug!(base = %rates.base, count = rates.conversion_rates.len(), "Fetched rates");
        Ok(rates)
    }

    #[instrument(skip(self))]
    pub async fn convert(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        amount: Option<&str>,
    ) -> Result<ConversionResult, RateError> {
        let from = CurrencyCode::parse("from", from.unwrap_or(DEFAULT_FROM))?;
        let to = CurrencyCode::parse("to", to.unwrap_or(DEFAULT_TO))?;
        let amount = Amount::parse(amount.unwrap_or(DEFAULT_AMOUNT))?;
        let key = self.api_key()?;

        let quote = self.provider.pair(key, &from, &to, amount).await?;
        debug!(converted = quote.converted, rate = quote.rate, "Converted amount");
        Ok(ConversionResult::new(from, to, amount, quote))
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

use crate::core::{
    Amount, ApiKey, CurrencyCode, ExchangeRateProvider, PairQuote, RateError, RateSet,
};

const USER_AGENT: &str = concat!("rate-proxy/", env!("CARGO_PKG_VERSION"));

/// Client for the exchangerate-api.com v6 REST API.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Joins percent-encoded segments onto `{base_url}/v6/{key}`.
    fn endpoint(&self, key: &ApiKey, segments: &[&str]) -> String {
        let mut url = format!("{}/v6/{}", self.base_url, encode(key.expose()));
        for segment in segments {
            url.push('/');
            url.push_str(&encode(segment));
        }
        url
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, RateError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // The provider reports failures in-band, often alongside a 4xx status
        if let Ok(envelope) = serde_json::from_str::<ResultEnvelope>(&text) {
            if envelope.result.as_deref() == Some("error") {
                let error_type = envelope
                    .error_type
                    .unwrap_or_else(|| "unknown-error".to_string());
                warn!(%status, %error_type, "Exchange rate API reported an error");
                return Err(RateError::UpstreamRejected(error_type));
            }
        }

        if !status.is_success() {
            return Err(RateError::unavailable(format!("HTTP error: {status}")));
        }

        serde_json::from_str(&text)
            .map_err(|e| RateError::unavailable(format!("Failed to parse JSON response: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    base_code: Option<String>,
    #[serde(default)]
    conversion_rates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    conversion_result: f64,
    conversion_rate: f64,
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "LatestRatesFetch", skip(self, key), fields(base = %base))]
    async fn latest(&self, key: &ApiKey, base: &CurrencyCode) -> Result<RateSet, RateError> {
        let url = self.endpoint(key, &["latest", base.as_str()]);
        debug!("Requesting latest rates");

        let data: LatestResponse = self.fetch(&url).await?;
        debug!(count = data.conversion_rates.len(), "Received latest rates");

        Ok(RateSet {
            base: data.base_code.unwrap_or_else(|| base.to_string()),
            conversion_rates: data.conversion_rates,
        })
    }

    #[instrument(
        name = "PairConversionFetch",
        skip(self, key),
        fields(from = %from, to = %to, amount = %amount)
    )]
    async fn pair(
        &self,
        key: &ApiKey,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: Amount,
    ) -> Result<PairQuote, RateError> {
        let amount = amount.to_string();
        let url = self.endpoint(key, &["pair", from.as_str(), to.as_str(), &amount]);
        debug!("Requesting pair conversion");

        let data: PairResponse = self.fetch(&url).await?;

        Ok(PairQuote {
            converted: data.conversion_result,
            rate: data.conversion_rate,
        })
    }
}

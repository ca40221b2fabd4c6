//! Error taxonomy shared by the validator, the provider and the HTTP layer

use thiserror::Error;

/// `error-type` values documented by exchangerate-api.com.
pub const KNOWN_REJECTIONS: &[&str] = &[
    "unsupported-code",
    "malformed-request",
    "invalid-key",
    "inactive-account",
    "quota-reached",
    "plan-upgrade-required",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    /// Malformed currency code or amount. The message names the field.
    #[error("{0}")]
    InvalidInput(String),
    #[error("Exchange rate API key is not configured")]
    NotConfigured,
    /// Transport failure, timeout, non-2xx status or undecodable body.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The provider answered but reported `"result": "error"`.
    #[error("Upstream rejected request: {0}")]
    UpstreamRejected(String),
}

impl RateError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RateError::InvalidInput(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        RateError::UpstreamUnavailable(message.into())
    }

    /// The rejection's `error-type` when it is one the provider documents.
    pub fn known_rejection(&self) -> Option<&'static str> {
        match self {
            RateError::UpstreamRejected(error_type) => KNOWN_REJECTIONS
                .iter()
                .copied()
                .find(|known| *known == error_type.as_str()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest embeds the request URL in its Display output, and ours carries the key
        let err = err.without_url();
        if err.is_timeout() {
            RateError::unavailable(format!("Request timed out: {err}"))
        } else {
            RateError::unavailable(format!("Request error: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_rejection() {
        let err = RateError::UpstreamRejected("quota-reached".to_string());
        assert_eq!(err.known_rejection(), Some("quota-reached"));

        let err = RateError::UpstreamRejected("<script>alert(1)</script>".to_string());
        assert_eq!(err.known_rejection(), None);

        assert_eq!(RateError::NotConfigured.known_rejection(), None);
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::core::RateError;

pub const RATES_FAILURE_MESSAGE: &str = "Failed to fetch conversion rates";
pub const CONVERT_FAILURE_MESSAGE: &str = "Failed to convert currency";
pub const REJECTED_MESSAGE: &str = "Exchange rate provider rejected the request";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Route a [`RateError`] came from; picks the generic upstream failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Rates,
    Convert,
}

impl Endpoint {
    fn failure_message(self) -> &'static str {
        match self {
            Endpoint::Rates => RATES_FAILURE_MESSAGE,
            Endpoint::Convert => CONVERT_FAILURE_MESSAGE,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{source}")]
    Rate {
        endpoint: Endpoint,
        source: RateError,
    },
    #[error("{0}")]
    BadRequest(String),
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    pub fn rates(source: RateError) -> Self {
        ApiError::Rate {
            endpoint: Endpoint::Rates,
            source,
        }
    }

    pub fn convert(source: RateError) -> Self {
        ApiError::Rate {
            endpoint: Endpoint::Convert,
            source,
        }
    }
}

/// Shared by every error response so clients can branch on `status` alone.
#[derive(Serialize)]
pub struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody {
            status: "error",
            message: message.into(),
        }
    }
}

fn rate_error_response(endpoint: Endpoint, source: RateError) -> (StatusCode, String) {
    match source {
        RateError::InvalidInput(reason) => (StatusCode::BAD_REQUEST, reason),
        RateError::NotConfigured => {
            warn!("Request refused: exchange rate API key is not configured");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Exchange rate service is not configured".to_string(),
            )
        }
        RateError::UpstreamUnavailable(cause) => {
            error!(?endpoint, %cause, "Exchange rate provider unavailable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                endpoint.failure_message().to_string(),
            )
        }
        RateError::UpstreamRejected(_) => {
            // Only the provider's documented vocabulary is echoed back
            let message = match source.known_rejection() {
                Some(error_type) => format!("{REJECTED_MESSAGE}: {error_type}"),
                None => REJECTED_MESSAGE.to_string(),
            };
            error!(?endpoint, error_type = ?source, "Exchange rate provider rejected request");
            (StatusCode::BAD_GATEWAY, message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Rate { endpoint, source } => rate_error_response(endpoint, source),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

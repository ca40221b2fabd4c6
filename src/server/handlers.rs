use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::core::{ConversionResult, RateSet};

pub const SERVICE_NAME: &str = "rate-proxy";

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    from: Option<String>,
    to: Option<String>,
    amount: Option<String>,
}

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
pub struct Success<T> {
    status: &'static str,
    #[serde(flatten)]
    data: T,
}

impl<T> Success<T> {
    fn new(data: T) -> Json<Self> {
        Json(Success {
            status: "success",
            data,
        })
    }
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query.map(|Query(params)| params).map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    })
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

pub async fn get_rates(
    State(state): State<AppState>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> ApiResult<Json<Success<RateSet>>> {
    let params = query_params(query)?;
    let rates = state
        .service
        .get_rates(params.base.as_deref())
        .await
        .map_err(ApiError::rates)?;
    Ok(Success::new(rates))
}

pub async fn convert(
    State(state): State<AppState>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> ApiResult<Json<Success<ConversionResult>>> {
    let params = query_params(query)?;
    let result = state
        .service
        .convert(
            params.from.as_deref(),
            params.to.as_deref(),
            params.amount.as_deref(),
        )
        .await
        .map_err(ApiError::convert)?;
    Ok(Success::new(result))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

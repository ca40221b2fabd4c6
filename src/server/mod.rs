//! HTTP surface: routes plus the middleware chain wrapped around them

pub mod error;
pub mod handlers;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::service::RateService;
use error::{ErrorBody, INTERNAL_ERROR_MESSAGE};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RateService>,
}

pub fn app_router(service: Arc<RateService>, cors_origins: &[String]) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/rates", get(handlers::get_rates))
        .route("/convert", get(handlers::convert))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(%detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApiKey, RateError};
    use crate::service::tests::FakeProvider;
    use super::error::{CONVERT_FAILURE_MESSAGE, RATES_FAILURE_MESSAGE, REJECTED_MESSAGE};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:5173";

    fn router(provider: Arc<FakeProvider>, key: Option<&str>) -> Router {
        let service = RateService::new(key.and_then(ApiKey::new), provider);
        app_router(Arc::new(service), &[ORIGIN.to_string()])
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send_get(router(Arc::default(), None), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy", "service": "rate-proxy"}));
    }

    #[tokio::test]
    async fn test_rates_success_shape() {
        let (status, body) = send_get(router(Arc::default(), Some("k")), "/rates?base=GBP").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "base": "GBP",
                "conversion_rates": {"EUR": 0.85, "GBP": 0.73}
            })
        );
    }

    #[tokio::test]
    async fn test_convert_success_shape() {
        let (status, body) = send_get(
            router(Arc::default(), Some("k")),
            "/convert?from=USD&to=EUR&amount=100",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "from": "USD",
                "to": "EUR",
                "amount": 100,
                "converted": 85.0,
                "rate": 0.85
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_bad_requests() {
        for uri in [
            "/rates?base=usd",
            "/rates?base=",
            "/rates?base=US%2FD",
            "/convert?from=US",
            "/convert?to=EURO",
            "/convert?amount=0",
            "/convert?amount=-5",
            "/convert?amount=abc",
        ] {
            let provider = Arc::new(FakeProvider::default());
            let (status, body) = send_get(router(provider.clone(), Some("k")), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["status"], "error");
            assert!(body["message"].as_str().unwrap().contains("Invalid"), "{uri}");
            assert_eq!(provider.call_count(), 0, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_query_param_is_bad_request() {
        let (status, body) = send_get(
            router(Arc::default(), Some("k")),
            "/rates?base=USD&base=EUR",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_unconfigured_key_is_service_unavailable() {
        for uri in ["/rates", "/convert?amount=10"] {
            let provider = Arc::new(FakeProvider::default());
            let (status, body) = send_get(router(provider.clone(), None), uri).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body["status"], "error");
            assert_eq!(provider.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_messages_per_endpoint() {
        for (uri, message) in [
            ("/rates", RATES_FAILURE_MESSAGE),
            ("/convert?amount=10", CONVERT_FAILURE_MESSAGE),
        ] {
            let provider = Arc::new(FakeProvider::failing(RateError::unavailable(
                "Request error: connection reset",
            )));
            let (status, body) = send_get(router(provider, Some("k")), uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body, json!({"status": "error", "message": message}), "{uri}");
        }
        assert_eq!(RATES_FAILURE_MESSAGE, "Failed to fetch conversion rates");
        assert_eq!(CONVERT_FAILURE_MESSAGE, "Failed to convert currency");
    }

    #[tokio::test]
    async fn test_upstream_rejection_is_bad_gateway() {
        let provider = Arc::new(FakeProvider::failing(RateError::UpstreamRejected(
            "unsupported-code".to_string(),
        )));
        let (status, body) = send_get(router(provider, Some("k")), "/convert?from=XYZ").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["message"],
            format!("{REJECTED_MESSAGE}: unsupported-code")
        );
    }

    #[tokio::test]
    async fn test_unknown_rejection_type_is_not_echoed() {
        let provider = Arc::new(FakeProvider::failing(RateError::UpstreamRejected(
            "<b>call 555-0100</b>".to_string(),
        )));
        let (status, body) = send_get(router(provider, Some("k")), "/rates").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({"status": "error", "message": REJECTED_MESSAGE}));
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_envelope() {
        let (status, body) = send_get(router(Arc::default(), None), "/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"status": "error", "message": "Not found"}));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, ORIGIN)
            .body(Body::empty())
            .unwrap();
        let response = router(Arc::default(), None).oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static(ORIGIN))
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = router(Arc::default(), None).oneshot(request).await.unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_panics_render_error_envelope_with_cors() {
        let request = Request::builder()
            .uri("/rates")
            .header(header::ORIGIN, ORIGIN)
            .body(Body::empty())
            .unwrap();
        let app = router(Arc::new(FakeProvider::panicking()), Some("k"));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static(ORIGIN))
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"status": "error", "message": INTERNAL_ERROR_MESSAGE})
        );
    }
}

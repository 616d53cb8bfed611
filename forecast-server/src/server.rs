//! HTTP surface: one route, `/forecast`, bound to the forecast pipeline.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
};
use forecast_core::{ForecastError, GridForecastProvider, summarize};
use tracing::{debug, error, info};

/// Shared state for the handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn GridForecastProvider>,
}

/// Build the router. The method is not restricted and the body reaches the
/// handler untouched.
pub fn build_router(provider: Arc<dyn GridForecastProvider>) -> Router {
    Router::new()
        .route("/forecast", any(handle_forecast_request))
        .with_state(AppState { provider })
}

/// POST /forecast
pub async fn handle_forecast_request(State(state): State<AppState>, body: Bytes) -> Response {
    match summarize(state.provider.as_ref(), &body).await {
        Ok(line) => (StatusCode::OK, line).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ForecastError) -> Response {
    if err.is_client_error() {
        debug!(error = %err, "rejected forecast request");
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    // Upstream detail stays in the log, the caller gets an empty 500.
    let err = anyhow::Error::new(err);
    error!("internal server error occurred: {err:#}");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

pub async fn run(addr: SocketAddr, provider: Arc<dyn GridForecastProvider>) -> anyhow::Result<()> {
    let router = build_router(provider);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "forecast server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Forecast server terminated unexpectedly")?;

    info!("forecast server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use forecast_core::{ForecastSummary, ProviderError};
    use tower::ServiceExt;

    const PATH: &str = "/forecast";
    const LATITUDE: f64 = 38.672222;
    const LONGITUDE: f64 = -121.157778;
    const FORECAST_URL: &str = "http://weatherserver";
    const RANGE_MESSAGE: &str =
        "Latitude must be between -90 and 90, and longitude must be between -180 and 180";

    type ResolveFn = fn() -> Result<String, ProviderError>;
    type FetchFn = fn() -> Result<ForecastSummary, ProviderError>;

    /// Canned provider that records how it was called.
    #[derive(Debug)]
    struct StubProvider {
        resolve: ResolveFn,
        fetch: FetchFn,
        resolve_calls: Mutex<Vec<(f64, f64)>>,
        fetch_calls: Mutex<Vec<String>>,
        total_calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(resolve: ResolveFn, fetch: FetchFn) -> Arc<Self> {
            Arc::new(Self {
                resolve,
                fetch,
                resolve_calls: Mutex::new(Vec::new()),
                fetch_calls: Mutex::new(Vec::new()),
                total_calls: AtomicUsize::new(0),
            })
        }

        fn happy() -> Arc<Self> {
            Self::new(|| Ok(FORECAST_URL.to_string()), sunny)
        }

        fn calls(&self) -> usize {
            self.total_calls.load(Ordering::SeqCst)
        }
    }

    fn sunny() -> Result<ForecastSummary, ProviderError> {
        Ok(ForecastSummary { short_forecast: "Sunny".to_string(), temperature: 49.0 })
    }

    #[async_trait]
    impl GridForecastProvider for StubProvider {
        async fn resolve_grid_url(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<String, ProviderError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            self.resolve_calls.lock().unwrap().push((latitude, longitude));
            (self.resolve)()
        }

        async fn fetch_forecast(&self, grid_url: &str) -> Result<ForecastSummary, ProviderError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            self.fetch_calls.lock().unwrap().push(grid_url.to_string());
            (self.fetch)()
        }
    }

    fn coordinates_body() -> String {
        serde_json::json!({ "latitude": LATITUDE, "longitude": LONGITUDE }).to_string()
    }

    async fn send(router: Router, method: &str, body: impl Into<Body>) -> (StatusCode, String) {
        let req = Request::builder().method(method).uri(PATH).body(body.into()).unwrap();

        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn happy_path_returns_200_with_summary() {
        let stub = StubProvider::happy();
        let router = build_router(stub.clone());

        let (status, body) = send(router, "POST", coordinates_body()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Sunny and cold temperature\n");
        assert_eq!(*stub.resolve_calls.lock().unwrap(), vec![(LATITUDE, LONGITUDE)]);
        assert_eq!(*stub.fetch_calls.lock().unwrap(), vec![FORECAST_URL.to_string()]);
    }

    #[tokio::test]
    async fn resolve_error_returns_500_with_empty_body() {
        let stub = StubProvider::new(|| Err(ProviderError::GridDataMissing), sunny);
        let router = build_router(stub.clone());

        let (status, body) = send(router, "POST", coordinates_body()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
        assert!(stub.fetch_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn grid_not_found_returns_400_with_message() {
        let stub = StubProvider::new(|| Err(ProviderError::GridDataNotFound), sunny);
        let router = build_router(stub.clone());

        let (status, body) = send(router, "POST", coordinates_body()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "forecastGridData not available for given coordinates");
        assert!(stub.fetch_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_error_returns_500_with_empty_body() {
        let stub = StubProvider::new(
            || Ok(FORECAST_URL.to_string()),
            || Err(ProviderError::ForecastPeriodsMissing),
        );
        let router = build_router(stub.clone());

        let (status, body) = send(router, "POST", coordinates_body()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn malformed_field_returns_500() {
        let stub = StubProvider::new(
            || Ok(FORECAST_URL.to_string()),
            || Err(ProviderError::ForecastFieldMissing("missing field `temperature`".into())),
        );

        let (status, body) = send(build_router(stub), "POST", coordinates_body()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn invalid_json_returns_400_without_calling_provider() {
        let stub = StubProvider::happy();
        let router = build_router(stub.clone());
        let payload = format!(r#"{{invalid"latitude":{LATITUDE} "longitude":{LONGITUDE}"#);

        let (status, body) = send(router, "POST", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Cannot decode json payload");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn array_body_returns_400_without_calling_provider() {
        let stub = StubProvider::happy();
        let router = build_router(stub.clone());
        let payload = serde_json::json!([LATITUDE, LONGITUDE]).to_string();

        let (status, body) = send(router, "POST", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Cannot decode json payload");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn missing_longitude_returns_400_without_calling_provider() {
        let stub = StubProvider::happy();
        let router = build_router(stub.clone());

        let payload = serde_json::json!({ "latitude": 38.5 }).to_string();

        let (status, body) = send(router, "POST", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, RANGE_MESSAGE);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn out_of_range_returns_400_without_calling_provider() {
        let stub = StubProvider::happy();

        for payload in [r#"{"latitude":100,"longitude":0}"#, r#"{"latitude":0,"longitude":-181}"#] {
            let (status, body) = send(build_router(stub.clone()), "POST", payload).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, RANGE_MESSAGE);
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn boundary_coordinates_are_accepted() {
        let stub = StubProvider::happy();
        let payload = r#"{"latitude":-90,"longitude":180}"#;

        let (status, _) = send(build_router(stub.clone()), "POST", payload).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*stub.resolve_calls.lock().unwrap(), vec![(-90.0, 180.0)]);
    }

    #[tokio::test]
    async fn repeated_requests_are_byte_identical() {
        let stub = StubProvider::happy();
        let router = build_router(stub.clone());

        let first = send(router.clone(), "POST", coordinates_body()).await;
        for _ in 0..3 {
            assert_eq!(send(router.clone(), "POST", coordinates_body()).await, first);
        }
        assert_eq!(stub.calls(), 8);
    }

    #[tokio::test]
    async fn method_is_not_enforced() {
        let router = build_router(StubProvider::happy());

        let (status, body) = send(router, "GET", coordinates_body()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Sunny and cold temperature\n");
    }

    #[tokio::test]
    async fn other_paths_are_not_routed() {
        let router = build_router(StubProvider::happy());
        let req = Request::builder()
            .method("POST")
            .uri("/weather")
            .body(Body::from(coordinates_body()))
            .unwrap();

        let resp = router.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

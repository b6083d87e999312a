#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use floors_api::config::{AccountRegistry, ServerConfig};
use floors_api::router::build_app_router;
use floors_api::state::AppState;
use floors_core::RateTable;
use floors_fetcher::{FailureCounters, FetcherConfig, MemoryCache, PriceFloorFetcher};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        accounts_file: None,
        rates_file: None,
        request_timeout_secs: 30,
    }
}

/// Build the full application router, mirroring `main.rs`.
///
/// Returns the fetcher too so tests can stop it or inspect it.
pub fn build_test_app(
    accounts: AccountRegistry,
    rates: RateTable,
) -> (Router, Arc<PriceFloorFetcher>) {
    let config = test_config();
    let fetcher = PriceFloorFetcher::start(
        FetcherConfig::default(),
        Arc::new(MemoryCache::new()),
        Arc::new(FailureCounters::new()),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        accounts: Arc::new(accounts),
        conversions: Arc::new(rates),
        fetcher: Arc::clone(&fetcher),
    };

    (build_app_router(state, &config), fetcher)
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: &'static str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

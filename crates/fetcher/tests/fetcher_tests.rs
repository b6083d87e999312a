//! Scheduler tests against an in-process floor endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::future::join_all;
use serde_json::json;

use floors_core::{AccountFetchConfig, AccountFloorConfig, FetchStatus, FloorRulesDocument};
use floors_fetcher::cache::RulesCache;
use floors_fetcher::{FailureCounters, FetchFailure, FetcherConfig, MemoryCache, PriceFloorFetcher};

const ACCOUNT_ID: &str = "acct-1";

// ---------------------------------------------------------------------------
// Test endpoint
// ---------------------------------------------------------------------------

type Hits = Arc<AtomicUsize>;

fn floor_data() -> serde_json::Value {
    json!({
        "currency": "USD",
        "modelgroups": [{
            "modelversion": "m1",
            "schema": {"fields": ["mediaType"]},
            "values": {"banner": 1.5}
        }]
    })
}

async fn valid(State(hits): State<Hits>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    ([("max-age", "20")], Json(floor_data()))
}

async fn server_error(State(hits): State<Hits>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn too_large(State(hits): State<Hits>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    let mut data = floor_data();
    data["floorprovider"] = json!("x".repeat(4096));
    Json(data)
}

async fn malformed(State(hits): State<Hits>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    "this is not json"
}

async fn invalid(State(hits): State<Hits>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"currency": "USD", "modelgroups": []}))
}

struct TestServer {
    addr: SocketAddr,
    hits: Hits,
}

impl TestServer {
    async fn spawn() -> Self {
        let hits = Hits::default();
        let app = Router::new()
            .route("/valid", get(valid))
            .route("/error", get(server_error))
            .route("/large", get(too_large))
            .route("/malformed", get(malformed))
            .route("/invalid", get(invalid))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fetcher_config() -> FetcherConfig {
    FetcherConfig {
        workers: 4,
        queue_capacity: 16,
        channel_capacity: 64,
        tick_interval: Duration::from_millis(20),
    }
}

fn account(url: String) -> AccountFloorConfig {
    AccountFloorConfig {
        use_dynamic_data: true,
        fetch: AccountFetchConfig {
            enabled: true,
            url,
            timeout_ms: 2000,
            max_file_size_kb: 1,
            period_sec: 3600,
            max_age_sec: 7200,
            account_id: ACCOUNT_ID.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

fn start(cache: Arc<MemoryCache>, counters: Arc<FailureCounters>) -> Arc<PriceFloorFetcher> {
    PriceFloorFetcher::start(fetcher_config(), cache, counters)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// -- cache misses / hits ------------------------------------------------------

#[tokio::test]
async fn concurrent_misses_trigger_single_request() {
    let server = TestServer::spawn().await;
    let cache = Arc::new(MemoryCache::new());
    let fetcher = start(cache.clone(), Arc::new(FailureCounters::new()));
    let account = account(server.url("/valid"));

    let results = join_all((0..10).map(|_| fetcher.fetch(&account))).await;

    assert!(results
        .iter()
        .all(|(doc, status)| doc.is_none() && *status == FetchStatus::InProgress));

    let url = account.fetch.url.clone();
    assert!(eventually(|| cache.get(&url).is_some()).await);
    assert_eq!(server.hits(), 1);

    let (doc, status) = fetcher.fetch(&account).await;
    assert_eq!(status, FetchStatus::Success);
    let data = doc.unwrap().data.unwrap();
    assert_eq!(data.model_groups[0].values["banner"], 1.5);

    fetcher.stop();
}

#[tokio::test]
async fn max_age_header_extends_cache_lifetime() {
    let server = TestServer::spawn().await;
    let cache = Arc::new(MemoryCache::new());
    let fetcher = start(cache.clone(), Arc::new(FailureCounters::new()));

    let mut account = account(server.url("/valid"));
    account.fetch.period_sec = 10;
    account.fetch.max_age_sec = 5;
    fetcher.fetch(&account).await;

    let url = account.fetch.url.clone();
    assert!(eventually(|| cache.get(&url).is_some()).await);
    let ttl = cache.expires_in(&url).unwrap();
    assert!(ttl > Duration::from_secs(5), "ttl was {ttl:?}");
    assert!(ttl <= Duration::from_secs(20), "ttl was {ttl:?}");

    fetcher.stop();
}

#[tokio::test]
async fn cached_entry_without_data_reports_error() {
    let cache = Arc::new(MemoryCache::new());
    let fetcher = start(cache.clone(), Arc::new(FailureCounters::new()));
    let account = account("http://127.0.0.1:9/floors.json".into());
    cache.set(
        &account.fetch.url,
        FloorRulesDocument::default(),
        Duration::from_secs(60),
    );

    let (doc, status) = fetcher.fetch(&account).await;

    assert!(doc.is_none());
    assert_eq!(status, FetchStatus::Error);
    fetcher.stop();
}

#[tokio::test]
async fn disabled_or_unusable_config_is_not_fetched() {
    let server = TestServer::spawn().await;
    let fetcher = start(
        Arc::new(MemoryCache::new()),
        Arc::new(FailureCounters::new()),
    );

    let mut no_dynamic = account(server.url("/valid"));
    no_dynamic.use_dynamic_data = false;
    let mut fetch_off = account(server.url("/valid"));
    fetch_off.fetch.enabled = false;
    let relative = account("/valid".into());
    let wrong_scheme = account("ftp://127.0.0.1/valid".into());

    for config in [no_dynamic, fetch_off, relative, wrong_scheme] {
        assert_eq!(fetcher.fetch(&config).await, (None, FetchStatus::None));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.hits(), 0);
    fetcher.stop();
}

// -- failures -----------------------------------------------------------------

#[tokio::test]
async fn failures_recorded_by_class_and_cache_untouched() {
    let server = TestServer::spawn().await;
    let cache = Arc::new(MemoryCache::new());
    let counters = Arc::new(FailureCounters::new());
    let fetcher = start(cache.clone(), counters.clone());

    let cases = [
        ("/error", FetchFailure::Request),
        ("/large", FetchFailure::TooLarge),
        ("/malformed", FetchFailure::Malformed),
        ("/invalid", FetchFailure::Invalid),
    ];

    for (path, failure) in cases {
        let (_, status) = fetcher.fetch(&account(server.url(path))).await;
        assert_eq!(status, FetchStatus::InProgress);
        assert!(
            eventually(|| counters.count(ACCOUNT_ID, failure) == 1).await,
            "no {failure:?} failure recorded for {path}"
        );
    }

    assert_eq!(counters.total(), 4);
    assert!(cache.is_empty());
    fetcher.stop();
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_failure() {
    let counters = Arc::new(FailureCounters::new());
    let fetcher = start(Arc::new(MemoryCache::new()), counters.clone());

    // Port 9 (discard) is not listening on loopback.
    let mut account = account("http://127.0.0.1:9/floors.json".into());
    account.fetch.timeout_ms = 200;
    fetcher.fetch(&account).await;

    assert!(eventually(|| counters.count(ACCOUNT_ID, FetchFailure::Request) == 1).await);
    fetcher.stop();
}

// -- refetch / stop -----------------------------------------------------------

#[tokio::test]
async fn documents_are_refetched_every_period() {
    let server = TestServer::spawn().await;
    let fetcher = start(
        Arc::new(MemoryCache::new()),
        Arc::new(FailureCounters::new()),
    );

    let mut account = account(server.url("/valid"));
    account.fetch.period_sec = 1;
    fetcher.fetch(&account).await;

    assert!(eventually(|| server.hits() >= 2).await);
    fetcher.stop();
}

#[tokio::test]
async fn failed_fetches_are_retried_next_period() {
    let server = TestServer::spawn().await;
    let counters = Arc::new(FailureCounters::new());
    let fetcher = start(Arc::new(MemoryCache::new()), counters.clone());

    let mut account = account(server.url("/error"));
    account.fetch.period_sec = 1;
    fetcher.fetch(&account).await;

    assert!(eventually(|| counters.count(ACCOUNT_ID, FetchFailure::Request) >= 2).await);
    fetcher.stop();
}

#[tokio::test]
async fn stop_is_idempotent_and_halts_fetching() {
    let server = TestServer::spawn().await;
    let fetcher = start(
        Arc::new(MemoryCache::new()),
        Arc::new(FailureCounters::new()),
    );

    fetcher.stop();
    fetcher.stop();
    assert!(fetcher.is_stopped());

    let (doc, status) = fetcher.fetch(&account(server.url("/valid"))).await;
    assert!(doc.is_none());
    assert_eq!(status, FetchStatus::None);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.hits(), 0);
}

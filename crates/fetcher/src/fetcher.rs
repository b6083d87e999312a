//! Dynamic floor-rules fetch scheduler.
//!
//! [`PriceFloorFetcher`] answers request handlers from the cache and never
//! waits on the network. A cache miss enqueues a fetch request to a single
//! coordinator task, which deduplicates first fetches per URL, hands work
//! to a bounded [`WorkerPool`] and keeps a heap of scheduled refetches.
//! Workers fetch, validate and cache documents, then always schedule the
//! next refetch of the same URL one period later.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use floors_core::validation::validate_fetched_rules;
use floors_core::{
    AccountFetchConfig, AccountFloorConfig, FetchStatus, FloorData, FloorRulesDocument,
};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::RulesCache;
use crate::config::FetcherConfig;
use crate::error::{FetchError, PoolError};
use crate::metrics::FetchMetrics;
use crate::pool::WorkerPool;
use crate::queue::{FetchInfo, FetchQueue};

/// Response header carrying the provider's preferred cache lifetime.
pub const MAX_AGE_HEADER: &str = "max-age";

/// Cache lifetime of a fetched document.
///
/// When the provider's `max-age` is longer than the refetch period and
/// below `i32::MAX`, the longer of it and the account's `max_age_sec`
/// applies; otherwise `max_age_sec` alone.
pub fn cache_ttl(max_age: Option<u64>, period_sec: u64, default_ttl_sec: u64) -> Duration {
    match max_age {
        Some(age) if age > period_sec && age < i32::MAX as u64 => {
            Duration::from_secs(age.max(default_ttl_sec))
        }
        _ => Duration::from_secs(default_ttl_sec),
    }
}

/// `true` for an absolute `http`/`https` URL with a host.
pub fn is_fetchable_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// PriceFloorFetcher
// ---------------------------------------------------------------------------

/// Handle to the running scheduler.
///
/// Created once at startup via [`PriceFloorFetcher::start`]; the returned
/// `Arc` is cloned into request handlers.
pub struct PriceFloorFetcher {
    inbound: mpsc::Sender<FetchInfo>,
    cache: Arc<dyn RulesCache>,
    cancel: CancellationToken,
}

impl PriceFloorFetcher {
    /// Spawn the coordinator task. Must be called inside a tokio runtime.
    pub fn start(
        config: FetcherConfig,
        cache: Arc<dyn RulesCache>,
        metrics: Arc<dyn FetchMetrics>,
    ) -> Arc<Self> {
        let (inbound, receiver) = mpsc::channel(config.channel_capacity.max(1));
        let cancel = CancellationToken::new();

        let worker = Arc::new(Worker {
            client: reqwest::Client::new(),
            cache: cache.clone(),
            metrics,
            inbound: inbound.clone(),
        });

        let coordinator = Coordinator {
            receiver,
            queue: FetchQueue::new(),
            requested: HashSet::new(),
            pool: WorkerPool::new(config.workers, config.queue_capacity),
            worker,
            cancel: cancel.clone(),
        };
        tokio::spawn(coordinator.run(config));

        Arc::new(Self {
            inbound,
            cache,
            cancel,
        })
    }

    /// Look up the fetched document for an account.
    ///
    /// Returns immediately from the cache; on a miss, schedules a fetch
    /// and reports [`FetchStatus::InProgress`]. Once stopped, a miss
    /// reports [`FetchStatus::None`].
    pub async fn fetch(
        &self,
        account: &AccountFloorConfig,
    ) -> (Option<FloorRulesDocument>, FetchStatus) {
        let fetch = &account.fetch;
        if !account.use_dynamic_data || !fetch.enabled || !is_fetchable_url(&fetch.url) {
            return (None, FetchStatus::None);
        }

        if let Some(doc) = self.cache.get(&fetch.url) {
            if doc.data.is_some() {
                return (Some(doc), FetchStatus::Success);
            }
            return (None, FetchStatus::Error);
        }

        if self.cancel.is_cancelled() {
            return (None, FetchStatus::None);
        }

        if account.enabled && fetch.period_sec > 0 {
            let info = FetchInfo::new(fetch.clone());
            if self.inbound.send(info).await.is_err() {
                tracing::debug!(url = %fetch.url, "Fetch coordinator gone, request dropped");
            }
        }
        (None, FetchStatus::InProgress)
    }

    /// Stop the coordinator and its worker pool. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Sole owner of the refetch heap and the set of URLs already requested.
struct Coordinator {
    receiver: mpsc::Receiver<FetchInfo>,
    queue: FetchQueue,
    /// URLs that have had a first fetch requested. Never cleared.
    requested: HashSet<String>,
    pool: WorkerPool,
    worker: Arc<Worker>,
    cancel: CancellationToken,
}

impl Coordinator {
    async fn run(mut self, config: FetcherConfig) {
        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "Floor fetch coordinator started",
        );

        let mut ticker = tokio::time::interval(config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.pool.stop();
                    tracing::info!(pending = self.queue.len(), "Floor fetch coordinator stopped");
                    break;
                }
                Some(info) = self.receiver.recv() => self.handle_inbound(info),
                _ = ticker.tick() => self.submit_due(),
            }
        }
    }

    fn handle_inbound(&mut self, info: FetchInfo) {
        if info.refetch {
            self.queue.push(info);
            return;
        }
        if !self.requested.insert(info.url().to_string()) {
            return;
        }
        if let Err(info) = self.submit(info) {
            self.queue.push(info);
        }
    }

    fn submit_due(&mut self) {
        let now = Instant::now();
        while let Some(info) = self.queue.pop_due(now) {
            if let Err(info) = self.submit(info) {
                self.queue.push(info);
                break;
            }
        }
    }

    /// Hand `info` to the pool; gives it back when the pool is full.
    fn submit(&self, info: FetchInfo) -> Result<(), FetchInfo> {
        let worker = self.worker.clone();
        let job = info.clone();
        match self.pool.try_submit(async move { worker.fetch_and_cache(job).await }) {
            Ok(()) => Ok(()),
            Err(PoolError::Full) => {
                tracing::debug!(url = %info.url(), "Fetch pool saturated, deferring");
                Err(info)
            }
            Err(PoolError::Stopped) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct Worker {
    client: reqwest::Client,
    cache: Arc<dyn RulesCache>,
    metrics: Arc<dyn FetchMetrics>,
    inbound: mpsc::Sender<FetchInfo>,
}

impl Worker {
    async fn fetch_and_cache(&self, info: FetchInfo) {
        let config = &info.config;

        match self.fetch_and_validate(config).await {
            Ok((data, max_age)) => {
                let ttl = cache_ttl(max_age, config.period_sec, config.max_age_sec);
                self.cache
                    .set(&config.url, FloorRulesDocument::from_data(data), ttl);
                tracing::debug!(
                    account_id = %config.account_id,
                    url = %config.url,
                    ttl_secs = ttl.as_secs(),
                    "Cached fetched floor rules",
                );
            }
            Err(e) => {
                tracing::warn!(
                    account_id = %config.account_id,
                    url = %config.url,
                    error = %e,
                    "Floor rules fetch failed",
                );
                self.metrics
                    .record_fetch_failure(&config.account_id, e.failure());
            }
        }

        let next = Instant::now() + Duration::from_secs(config.period_sec);
        let refetch = FetchInfo::refetch_at(info.config, next);
        if self.inbound.send(refetch).await.is_err() {
            tracing::debug!("Fetch coordinator gone, refetch dropped");
        }
    }

    async fn fetch_and_validate(
        &self,
        config: &AccountFetchConfig,
    ) -> Result<(FloorData, Option<u64>), FetchError> {
        let response = self
            .client
            .get(&config.url)
            .timeout(Duration::from_millis(config.timeout_ms))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let max_age = parse_max_age(response.headers());
        let body = read_capped(response, config.max_file_size_kb * 1024).await?;

        let data: FloorData = serde_json::from_slice(&body)?;
        validate_fetched_rules(config.max_rules, &data)?;
        Ok((data, max_age))
    }
}

fn parse_max_age(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(MAX_AGE_HEADER)?.to_str().ok()?;
    match raw.trim().parse() {
        Ok(age) => Some(age),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "Ignoring unparseable max-age header");
            None
        }
    }
}

/// Read the body, failing once it exceeds `limit` bytes. A limit of 0
/// disables the check.
async fn read_capped(mut response: reqwest::Response, limit: u64) -> Result<Vec<u8>, FetchError> {
    if limit > 0 && response.content_length().is_some_and(|len| len > limit) {
        return Err(FetchError::TooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if limit > 0 && (body.len() + chunk.len()) as u64 > limit {
            return Err(FetchError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Background fetching and caching of remote floor-rules documents.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod pool;
pub mod queue;

pub use cache::{MemoryCache, RulesCache};
pub use config::FetcherConfig;
pub use error::{FetchError, PoolError};
pub use fetcher::{cache_ttl, PriceFloorFetcher};
pub use metrics::{FailureCounters, FetchFailure, FetchMetrics, LogMetrics};

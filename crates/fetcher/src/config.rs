use std::time::Duration;

/// Default number of concurrent fetch workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Default number of fetches that may wait for a free worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20_000;

/// Default capacity of the coordinator's inbound channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 20_000;

/// How often the coordinator checks the refetch heap.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduler sizing, shared by every account.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Workers performing HTTP fetches concurrently.
    pub workers: usize,
    /// Admitted fetches allowed to wait for a worker.
    pub queue_capacity: usize,
    /// Bounded inbound channel between callers, workers and the coordinator.
    pub channel_capacity: usize,
    pub tick_interval: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl FetcherConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default  |
    /// |------------------------|----------|
    /// | `FLOORS_FETCH_WORKERS` | `20`     |
    /// | `FLOORS_FETCH_QUEUE`   | `20000`  |
    /// | `FLOORS_FETCH_CHANNEL` | `20000`  |
    ///
    /// Unparseable or zero values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            workers: env_usize("FLOORS_FETCH_WORKERS", DEFAULT_WORKERS),
            queue_capacity: env_usize("FLOORS_FETCH_QUEUE", DEFAULT_QUEUE_CAPACITY),
            channel_capacity: env_usize("FLOORS_FETCH_CHANNEL", DEFAULT_CHANNEL_CAPACITY),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

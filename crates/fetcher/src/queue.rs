//! Min-heap of scheduled fetches, ordered by due time.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use floors_core::AccountFetchConfig;
use tokio::time::Instant;

/// One scheduled fetch of an account's floor endpoint.
#[derive(Debug, Clone)]
pub struct FetchInfo {
    pub config: AccountFetchConfig,
    pub fetch_time: Instant,
    /// Set on worker-scheduled refetches, which bypass URL deduplication.
    pub refetch: bool,
}

impl FetchInfo {
    /// A first fetch, due immediately.
    pub fn new(config: AccountFetchConfig) -> Self {
        Self {
            config,
            fetch_time: Instant::now(),
            refetch: false,
        }
    }

    pub fn refetch_at(config: AccountFetchConfig, fetch_time: Instant) -> Self {
        Self {
            config,
            fetch_time,
            refetch: true,
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

// Heap order considers the due time only.
impl PartialEq for FetchInfo {
    fn eq(&self, other: &Self) -> bool {
        self.fetch_time == other.fetch_time
    }
}

impl Eq for FetchInfo {}

impl PartialOrd for FetchInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FetchInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fetch_time.cmp(&other.fetch_time)
    }
}

/// Earliest-due-first queue. Owned by the coordinator; not shared.
#[derive(Debug, Default)]
pub struct FetchQueue {
    heap: BinaryHeap<Reverse<FetchInfo>>,
}

impl FetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, info: FetchInfo) {
        self.heap.push(Reverse(info));
    }

    /// Pop the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<FetchInfo> {
        match self.heap.peek() {
            Some(Reverse(top)) if top.fetch_time <= now => self.heap.pop().map(|Reverse(info)| info),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

//! Fetch failure reporting.
//!
//! The scheduler only reports failures; how they are exported is up to the
//! [`FetchMetrics`] implementation. [`LogMetrics`] emits a `tracing` event
//! per failure, [`FailureCounters`] keeps in-memory counts.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Failure class of a dynamic fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchFailure {
    Request,
    TooLarge,
    Malformed,
    Invalid,
}

impl FetchFailure {
    /// Numeric code reported to metrics backends.
    pub fn code(self) -> u8 {
        match self {
            Self::Request => 1,
            Self::TooLarge => 2,
            Self::Malformed => 3,
            Self::Invalid => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::TooLarge => "too_large",
            Self::Malformed => "malformed",
            Self::Invalid => "invalid",
        }
    }
}

pub trait FetchMetrics: Send + Sync {
    fn record_fetch_failure(&self, account_id: &str, failure: FetchFailure);
}

/// Reports failures as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMetrics;

impl FetchMetrics for LogMetrics {
    fn record_fetch_failure(&self, account_id: &str, failure: FetchFailure) {
        tracing::info!(
            account_id,
            code = failure.code(),
            failure = failure.as_str(),
            "Floor fetch failure recorded",
        );
    }
}

/// In-memory failure counts per account and failure class.
#[derive(Debug, Default)]
pub struct FailureCounters {
    counts: Mutex<HashMap<(String, FetchFailure), u64>>,
}

impl FailureCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, account_id: &str, failure: FetchFailure) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts
            .get(&(account_id.to_string(), failure))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        counts.values().sum()
    }
}

impl FetchMetrics for FailureCounters {
    fn record_fetch_failure(&self, account_id: &str, failure: FetchFailure) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry((account_id.to_string(), failure)).or_default() += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! TTL cache of fetched floor documents, keyed by endpoint URL.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use floors_core::FloorRulesDocument;
use tokio::time::Instant;

/// Shared store between request handlers (readers) and fetch workers
/// (writers). Implementations synchronize internally.
pub trait RulesCache: Send + Sync {
    /// Live entry for `url`; expired entries are treated as absent.
    fn get(&self, url: &str) -> Option<FloorRulesDocument>;

    fn set(&self, url: &str, doc: FloorRulesDocument, ttl: Duration);
}

struct Entry {
    doc: FloorRulesDocument,
    expires_at: Instant,
}

/// In-process [`RulesCache`]. Expired entries are purged on every write.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before the entry for `url` expires.
    pub fn expires_in(&self, url: &str) -> Option<Duration> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(url)?;
        let now = Instant::now();
        (entry.expires_at > now).then(|| entry.expires_at - now)
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RulesCache for MemoryCache {
    fn get(&self, url: &str) -> Option<FloorRulesDocument> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(url)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.doc.clone())
    }

    fn set(&self, url: &str, doc: FloorRulesDocument, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            url.to_string(),
            Entry {
                doc,
                expires_at: now + ttl,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

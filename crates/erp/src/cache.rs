//! Time-bounded cache for ERP reads.

use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

/// How long a cached read stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub fn partner_key(partner_id: i64) -> String {
    format!("partner:{partner_id}")
}

pub fn project_key(project_id: i64) -> String {
    format!("project:{project_id}")
}

/// Raw ERP read results keyed by `"<kind>:<id>"`.
#[derive(Debug)]
pub struct TtlCache {
    entries: DashMap<String, (Instant, Value)>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// The cached value, if present and younger than the TTL. Expired
    /// entries are evicted on lookup.
    pub fn get(&self, key: &str) -> Option<Value> {
        let fresh = self.entries.get(key).and_then(|entry| {
            let (stored_at, value) = entry.value();
            (stored_at.elapsed() < self.ttl).then(|| value.clone())
        });
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    pub fn insert(&self, key: String, value: Value) {
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

//! Time-bounded response cache with lazy expiry and a periodic sweep.
//!
//! `get` checks expiry at read time and removes stale entries, so an expired
//! response is never returned even between sweeps. The sweep itself is driven
//! by a ticker task owned by the router's lifecycle (see `router` module);
//! it exists so keys that are never re-read do not accumulate. There is no
//! size bound; eviction is time-based only.

use crate::types::Response;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Default TTL when the request sets a cache key without a TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Interval of the background sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: Response,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a live entry. Expired entries are treated as misses and removed.
    pub fn get(&self, key: &str) -> Option<Response> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.response.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Lazy cleanup of the expired entry; re-check under the write lock in
        // case a concurrent put refreshed it.
        let mut entries = self.entries.write().unwrap();
        match entries.get(key).map(|e| e.is_expired(now)) {
            Some(true) => {
                entries.remove(key);
                None
            }
            Some(false) => entries.get(key).map(|e| e.response.clone()),
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, response: Response, ttl: Duration) {
        let entry = CacheEntry {
            response,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().unwrap().insert(key.into(), entry);
    }

    /// Purge every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

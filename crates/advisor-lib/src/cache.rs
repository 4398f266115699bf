//! TTL cache shielding providers from redundant calls
//!
//! Entries carry their own expiry. Reads treat expired entries as absent
//! and evict them; a background task can additionally purge them on an
//! interval so idle keys do not accumulate.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default time-to-live for cached provider results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Default interval between expired-entry sweeps
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL reported to operators and used by callers that have no specific TTL
    pub default_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_CACHE_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Hit/miss counters and current size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub items: usize,
}

/// Process-wide cache for provider results, shared behind an `Arc`
pub struct CacheManager {
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    last_refresh_ms: AtomicI64,
    config: CacheConfig,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            last_refresh_ms: AtomicI64::new(Utc::now().timestamp_millis()),
            config,
        }
    }

    /// Look up a fresh value of type `T`.
    ///
    /// Expired entries and entries holding a different type count as misses.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let now = Instant::now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.is_expired(now)));

        match lookup {
            Some((value, false)) => match value.downcast::<T>() {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(_) => {
                    debug!(key = %key, "Cached value has unexpected type");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            Some((_, true)) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace a value with its own TTL
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.set_shared(key, Arc::new(value), ttl);
    }

    /// Insert an already shared value
    pub fn set_shared<T: Any + Send + Sync>(&self, key: impl Into<String>, value: Arc<T>, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.clear();
        self.touch_last_refresh();
    }

    /// Remove every entry and report how many were dropped
    pub fn refresh(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        self.touch_last_refresh();
        info!(removed = removed, "Cache refreshed");
        removed
    }

    /// Remove all keys starting with `prefix`
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !key.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Drop expired entries without touching the counters
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            items: self.entries.len(),
        }
    }

    /// Keys currently stored, sorted, including ones not yet evicted after expiry
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn last_refresh(&self) -> DateTime<Utc> {
        let millis = self.last_refresh_ms.load(Ordering::Relaxed);
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    pub fn ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Spawn the periodic expired-entry sweep
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = self.config.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed = removed, "Purged expired cache entries");
                }
            }
        })
    }

    fn touch_last_refresh(&self) {
        self.last_refresh_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

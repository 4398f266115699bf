//! Per-client token-bucket admission control
//!
//! Buckets start full and refill lazily on each call, one full bucket per
//! whole interval elapsed since the last refill. Partial intervals earn
//! nothing, so a bucket admits at most `requests` calls per refill
//! interval. Buckets idle for longer than five refill intervals are
//! dropped by a periodic sweep.

use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Default requests admitted per interval
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default refill interval
pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_secs(60);

/// Idle buckets are swept after this many refill intervals
const IDLE_INTERVALS: u32 = 5;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Tokens per interval, also the bucket capacity
    pub requests: u32,
    pub interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: DEFAULT_RATE_LIMIT,
            interval: DEFAULT_RATE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: u64,
    last_refill: Instant,
    /// Last call from this client, used by the idle sweep
    last_seen: Instant,
}

impl TokenBucket {
    fn full(capacity: u64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, capacity: u64, interval: Duration, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let periods = elapsed.as_nanos() / interval.as_nanos().max(1);
        if periods > 0 {
            let earned = periods.saturating_mul(u128::from(capacity));
            let tokens = (u128::from(self.tokens) + earned).min(u128::from(capacity));
            self.tokens = u64::try_from(tokens).unwrap_or(capacity);
            self.last_refill = now;
        }
        self.last_seen = now;
    }
}

/// Token-bucket rate limiter keyed by client identity
pub struct RateLimiter {
    buckets: DashMap<String, TokenBucket>,
    capacity: u64,
    interval: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity: u64::from(config.requests.max(1)),
            interval: if config.interval.is_zero() {
                DEFAULT_RATE_INTERVAL
            } else {
                config.interval
            },
        }
    }

    /// Consume one token for `client_id`, returning false when exhausted
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut bucket = self
            .buckets
            .entry(client_id.to_string())
            .or_insert_with(|| TokenBucket::full(self.capacity, now));

        bucket.refill(self.capacity, self.interval, now);
        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Seconds a throttled client should wait before retrying
    pub fn retry_after_secs(&self) -> u64 {
        self.interval.as_secs().max(1)
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets untouched for longer than the idle window
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let idle_after = self.interval * IDLE_INTERVALS;
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) <= idle_after);
        before.saturating_sub(self.buckets.len())
    }

    /// Spawn the idle-bucket sweep, running every five refill intervals
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = self.interval * IDLE_INTERVALS;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.purge_idle();
                if removed > 0 {
                    debug!(removed = removed, "Evicted idle rate-limit buckets");
                }
            }
        })
    }
}

/// Resolve the identity a request is rate limited under.
///
/// Precedence: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// transport remote address with its port removed.
pub fn resolve_client_id(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    remote_addr: Option<&str>,
) -> String {
    if let Some(first) = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return first.to_string();
    }

    if let Some(ip) = real_ip.map(str::trim).filter(|value| !value.is_empty()) {
        return ip.to_string();
    }

    remote_addr
        .map(strip_port)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn strip_port(addr: &str) -> String {
    let addr = addr.trim();
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return ip.to_string();
    }
    match addr.rsplit_once(':') {
        Some((host, _port)) if !host.contains(':') => host.to_string(),
        _ => addr.to_string(),
    }
}

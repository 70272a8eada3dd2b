use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Upper bound on the advertised wait; also what a degenerate refill rate
/// reports instead of an unrepresentable duration.
pub(crate) const MAX_RETRY_WAIT: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-client token buckets held in process memory; a restart forgets
/// every client.
pub(crate) struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    max_clients: usize,
}

impl RateLimiter {
    pub(crate) fn new(max_clients: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_clients: max_clients.max(1),
        }
    }

    /// Takes one token for `key`, or returns how long until one is available.
    pub(crate) async fn check(&self, key: &str, cfg: &RateLimitConfig) -> Result<(), Duration> {
        self.check_at(key, cfg, Instant::now()).await
    }

    pub(crate) async fn check_at(
        &self,
        key: &str,
        cfg: &RateLimitConfig,
        now: Instant,
    ) -> Result<(), Duration> {
        let mut lock = self.buckets.lock().await;
        if lock.len() >= self.max_clients && !lock.contains_key(key) {
            prune_full_buckets(&mut lock, cfg, now, self.max_clients);
        }
        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + (elapsed * cfg.refill_per_sec)).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - bucket.tokens) / cfg.refill_per_sec;
            Err(Duration::try_from_secs_f64(wait.max(0.0))
                .map_or(MAX_RETRY_WAIT, |d| d.min(MAX_RETRY_WAIT)))
        }
    }

    #[cfg(test)]
    pub(crate) async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

/// Drops buckets that have refilled completely since they behave exactly
/// like a fresh client. If every client is still throttled the least recently
/// seen one is evicted to make room.
fn prune_full_buckets(
    map: &mut HashMap<String, Bucket>,
    cfg: &RateLimitConfig,
    now: Instant,
    max_clients: usize,
) {
    map.retain(|_, b| {
        let elapsed = now.saturating_duration_since(b.last_refill).as_secs_f64();
        b.tokens + elapsed * cfg.refill_per_sec < cfg.capacity
    });
    while map.len() >= max_clients {
        let Some(oldest) = map
            .iter()
            .min_by_key(|(_, b)| b.last_refill)
            .map(|(k, _)| k.clone())
        else {
            break;
        };
        map.remove(&oldest);
    }
}

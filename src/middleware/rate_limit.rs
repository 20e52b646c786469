//! In-memory sliding-window rate limiter, used on the login endpoint.
//! Per-process only; put a shared store in front of it when running
//! multiple replicas.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub struct RateLimiter {
    hits: RwLock<HashMap<String, Vec<Instant>>>,
    max_hits: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_hits: usize, window_secs: u64) -> Self {
        Self {
            hits: RwLock::new(HashMap::new()),
            max_hits,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record a hit for `key` (an IP, usually) and report whether it is
    /// still inside the allowance. Stale hits are pruned on the way in, so
    /// the map stays bounded by active keys.
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.write().await;

        let history = hits.entry(key.to_string()).or_default();
        history.retain(|stamp| now.duration_since(*stamp) < self.window);

        if history.len() < self.max_hits {
            history.push(now);
            true
        } else {
            false
        }
    }

    /// Drop keys whose entire history has aged out.
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut hits = self.hits.write().await;
        hits.retain(|_, history| {
            history.retain(|stamp| now.duration_since(*stamp) < self.window);
            !history.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_allowance_per_key() {
        let limiter = RateLimiter::new(2, 60);

        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);

        // other keys are unaffected
        assert!(limiter.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn window_expiry_restores_allowance() {
        let limiter = RateLimiter::new(1, 1);

        assert!(limiter.check("ip").await);
        assert!(!limiter.check("ip").await);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(limiter.check("ip").await);
    }

    #[tokio::test]
    async fn prune_drops_stale_keys() {
        let limiter = RateLimiter::new(5, 1);
        limiter.check("a").await;
        limiter.check("b").await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        limiter.prune().await;

        assert_eq!(limiter.hits.read().await.len(), 0);
    }
}

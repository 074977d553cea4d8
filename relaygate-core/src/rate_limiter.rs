//! Rate limiting implementation for RelayGate.
//!
//! Provides per-key rate limiting using a fixed window algorithm with
//! automatic cleanup of expired entries to prevent memory exhaustion.
//!
//! # Algorithm
//!
//! - Each key has a counter and the epoch millisecond at which its window ends
//! - If the key is unknown or its window has ended, a new window opens with a count of 1
//! - If under the limit, the counter increments and the request is allowed
//! - If at the limit, the request is denied and the entry is left untouched
//!
//! Windows do not slide, so up to twice the limit can pass around a boundary.
//!
//! # Memory Management
//!
//! Expired entries are swept when:
//! - Entry count exceeds the configured threshold
//! - Minimum interval since this limiter's last cleanup has passed
//!
//! # Thread Safety
//!
//! The whole lookup-check-increment runs under one `tokio::sync::Mutex`
//! guard, so concurrent calls for the same key never over-admit.
//!
//! # Example
//!
//! ```ignore
//! use relaygate_core::{RateLimiter, RateLimitConfig, RateLimitCleanupConfig};
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new();
//! let config = RateLimitConfig::new(1, Duration::from_secs(60));
//! let cleanup = RateLimitCleanupConfig::default();
//!
//! assert!(limiter.check_at("10.0.0.1", &config, &cleanup, 1_000).await);
//! assert!(!limiter.check_at("10.0.0.1", &config, &cleanup, 1_001).await);
//! ```

use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::types::{RateLimitCleanupConfig, RateLimitConfig, RateLimiter, RateWindowState};

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

impl RateLimiter {
    /// Checks whether a request for `key` is allowed right now.
    ///
    /// Returns `true` if the request is allowed, `false` if rate limited.
    pub async fn check(
        &self,
        key: &str,
        config: &RateLimitConfig,
        cleanup: &RateLimitCleanupConfig,
    ) -> bool {
        self.check_at(key, config, cleanup, now_ms()).await
    }

    /// Checks whether a request for `key` is allowed at `now_ms`.
    ///
    /// # Arguments
    ///
    /// * `key` - Client key (explicit key function result or client identity)
    /// * `config` - Window length and request budget
    /// * `cleanup` - Sweep policy for expired entries
    /// * `now_ms` - Current time in epoch milliseconds
    ///
    /// # Returns
    ///
    /// - `true` - Request is allowed
    /// - `false` - Request is rate limited (should return 429)
    pub async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        cleanup: &RateLimitCleanupConfig,
        now_ms: u64,
    ) -> bool {
        let mut windows = self.inner().lock().await;

        if cleanup.is_enabled()
            && windows.len() > cleanup.threshold
            && self.cleanup_due(cleanup).await
        {
            sweep_expired(&mut windows, now_ms);
        }

        match windows.get_mut(key) {
            Some(window) if !window.is_expired(now_ms) => {
                if window.count >= config.max_requests {
                    false
                } else {
                    window.count += 1;
                    true
                }
            }
            // Unknown key or finished window
            _ => {
                windows.insert(key.to_string(), RateWindowState::open(now_ms, config.window_ms()));
                true
            }
        }
    }

    /// Records a cleanup and returns true if the configured interval has passed.
    async fn cleanup_due(&self, cleanup: &RateLimitCleanupConfig) -> bool {
        let now = Instant::now();
        let mut last_cleanup = self.last_cleanup().lock().await;
        match *last_cleanup {
            Some(last) if now.duration_since(last) < cleanup.interval => false,
            _ => {
                *last_cleanup = Some(now);
                true
            }
        }
    }
}

fn sweep_expired(windows: &mut HashMap<String, RateWindowState>, now_ms: u64) {
    let before_count = windows.len();
    windows.retain(|_, window| !window.is_expired(now_ms));
    let removed = before_count - windows.len();
    if removed > 0 {
        debug!(
            removed_entries = removed,
            remaining_entries = windows.len(),
            "Rate limiter cleanup completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn config(max_requests: u32, window_ms: u64) -> RateLimitConfig {
        RateLimitConfig::new(max_requests, Duration::from_millis(window_ms))
    }

    fn no_cleanup() -> RateLimitCleanupConfig {
        RateLimitCleanupConfig {
            threshold: 0,
            interval: Duration::from_secs(60),
        }
    }

    // ===========================================
    // Basic rate limiting tests
    // ===========================================

    #[tokio::test]
    async fn test_first_request_allowed() {
        let limiter = RateLimiter::new();
        assert!(limiter.check_at("a", &config(5, 1_000), &no_cleanup(), 0).await);
    }

    #[tokio::test]
    async fn test_request_exceeding_limit_blocked() {
        let limiter = RateLimiter::new();
        let config = config(3, 1_000);

        for t in 0..3 {
            assert!(limiter.check_at("a", &config, &no_cleanup(), t).await);
        }
        assert!(!limiter.check_at("a", &config, &no_cleanup(), 3).await);
    }

    #[tokio::test]
    async fn test_denied_requests_do_not_mutate() {
        let limiter = RateLimiter::new();
        let config = config(1, 1_000);

        assert!(limiter.check_at("a", &config, &no_cleanup(), 10).await);
        for t in 11..16 {
            assert!(!limiter.check_at("a", &config, &no_cleanup(), t).await);
        }

        let windows = limiter.inner().lock().await;
        assert_eq!(
            windows.get("a"),
            Some(&RateWindowState {
                count: 1,
                expires_at_ms: 1_010
            })
        );
    }

    #[tokio::test]
    async fn test_window_resets_after_full_length() {
        let limiter = RateLimiter::new();
        let config = config(2, 1_000);

        assert!(limiter.check_at("a", &config, &no_cleanup(), 0).await);
        assert!(limiter.check_at("a", &config, &no_cleanup(), 500).await);
        assert!(!limiter.check_at("a", &config, &no_cleanup(), 999).await);

        // Exactly one window later a new window opens
        assert!(limiter.check_at("a", &config, &no_cleanup(), 1_000).await);
        let windows = limiter.inner().lock().await;
        assert_eq!(windows["a"].count, 1);
        assert_eq!(windows["a"].expires_at_ms, 2_000);
    }

    #[tokio::test]
    async fn test_boundary_admits_up_to_twice_the_limit() {
        let limiter = RateLimiter::new();
        let config = config(2, 1_000);

        // Window opens at 998 and ends at 1998; a new one opens right after
        let mut admitted = 0;
        for t in [998, 999, 1_998, 1_998] {
            if limiter.check_at("a", &config, &no_cleanup(), t).await {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 4);
    }

    #[tokio::test]
    async fn test_different_keys_independent() {
        let limiter = RateLimiter::new();
        let config = config(1, 1_000);

        assert!(limiter.check_at("a", &config, &no_cleanup(), 0).await);
        assert!(!limiter.check_at("a", &config, &no_cleanup(), 1).await);
        assert!(limiter.check_at("b", &config, &no_cleanup(), 1).await);
    }

    #[tokio::test]
    async fn test_wall_clock_check() {
        let limiter = RateLimiter::new();
        let config = config(1, 60_000);
        assert!(limiter.check("a", &config, &no_cleanup()).await);
        assert!(!limiter.check("a", &config, &no_cleanup()).await);
    }

    // ===========================================
    // Concurrent access tests
    // ===========================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_key_never_over_admits() {
        let limiter = RateLimiter::new();
        let config = Arc::new(config(10, 60_000));

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                let config = config.clone();
                tokio::spawn(async move { limiter.check_at("k", &config, &no_cleanup(), 5).await })
            })
            .collect();

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    // ===========================================
    // Cleanup tests
    // ===========================================

    #[tokio::test]
    async fn test_cleanup_disabled_when_threshold_zero() {
        let limiter = RateLimiter::new();
        let config = config(10, 100);

        for i in 0..20 {
            limiter
                .check_at(&format!("10.0.0.{i}"), &config, &no_cleanup(), 0)
                .await;
        }
        limiter.check_at("late", &config, &no_cleanup(), 10_000).await;

        assert_eq!(limiter.inner().lock().await.len(), 21);
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_entries_over_threshold() {
        let limiter = RateLimiter::new();
        let config = config(10, 100);
        let cleanup = RateLimitCleanupConfig {
            threshold: 5,
            interval: Duration::ZERO,
        };

        for i in 0..10 {
            limiter
                .check_at(&format!("10.0.0.{i}"), &config, &cleanup, 0)
                .await;
        }
        // All windows above have ended by t=1000
        limiter.check_at("fresh", &config, &cleanup, 1_000).await;

        let windows = limiter.inner().lock().await;
        assert_eq!(windows.len(), 1);
        assert!(windows.contains_key("fresh"));
    }

    #[tokio::test]
    async fn test_cleanup_respects_interval() {
        let limiter = RateLimiter::new();
        let config = config(10, 100);
        let cleanup = RateLimitCleanupConfig {
            threshold: 2,
            interval: Duration::from_secs(3_600),
        };

        for i in 0..3 {
            limiter.check_at(&format!("a{i}"), &config, &cleanup, 0).await;
        }
        // 3 entries > threshold: the first sweep drops a0..a2
        limiter.check_at("b0", &config, &cleanup, 1_000).await;
        assert_eq!(limiter.inner().lock().await.len(), 1);

        for i in 1..4 {
            limiter.check_at(&format!("b{i}"), &config, &cleanup, 1_000).await;
        }
        // Interval has not elapsed, so expired entries are kept
        limiter.check_at("c0", &config, &cleanup, 5_000).await;
        assert_eq!(limiter.inner().lock().await.len(), 5);
    }

    #[tokio::test]
    async fn test_separate_limiters_do_not_share_counters() {
        let first = RateLimiter::new();
        let second = RateLimiter::new();
        let config = config(1, 60_000);

        assert!(first.check_at("k", &config, &no_cleanup(), 0).await);
        assert!(second.check_at("k", &config, &no_cleanup(), 0).await);
    }
}

//! Connection management for the RelayGate server.
//!
//! - Connection limiting with a semaphore ([`ConnectionLimiter`])
//! - Active connection tracking with RAII guards ([`ConnectionTracker`])
//! - Draining on graceful shutdown

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Poll interval while draining connections.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
}

/// Marks one connection as active until dropped.
#[derive(Debug)]
pub struct TrackedConnection {
    active: Arc<AtomicUsize>,
}

impl Drop for TrackedConnection {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; it stays counted while the guard lives.
    pub fn track(&self) -> TrackedConnection {
        self.active.fetch_add(1, Ordering::SeqCst);
        TrackedConnection {
            active: Arc::clone(&self.active),
        }
    }

    /// Current active connection count.
    pub fn count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits for all connections to finish.
    /// Returns false if `timeout` elapsed first.
    pub async fn wait_for_shutdown(&self, timeout: Duration) -> bool {
        let start = Instant::now();

        while self.count() > 0 {
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }

        true
    }
}

/// Result of asking the limiter for room.
#[derive(Debug)]
pub enum Admission {
    /// No limit configured
    Unlimited,
    /// Holds one slot until dropped
    Permitted(OwnedSemaphorePermit),
    /// At capacity
    Rejected,
}

impl Admission {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

/// Caps the number of concurrent connections.
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    semaphore: Option<Arc<Semaphore>>,
    max_connections: usize,
}

impl ConnectionLimiter {
    /// Creates a limiter; `0` disables limiting.
    pub fn new(max_connections: usize) -> Self {
        let semaphore = (max_connections > 0).then(|| Arc::new(Semaphore::new(max_connections)));

        Self {
            semaphore,
            max_connections,
        }
    }

    /// Maximum number of connections (0 means unlimited).
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Tries to take a slot without waiting.
    pub fn admit(&self) -> Admission {
        match &self.semaphore {
            None => Admission::Unlimited,
            Some(semaphore) => match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => Admission::Permitted(permit),
                Err(_) => Admission::Rejected,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // ConnectionTracker tests
    // ===========================================

    #[test]
    fn test_tracker_counts_live_guards() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.count(), 0);

        let first = tracker.track();
        let second = tracker.track();
        assert_eq!(tracker.count(), 2);

        drop(first);
        assert_eq!(tracker.count(), 1);
        drop(second);
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_tracker_clone_shares_state() {
        let tracker1 = ConnectionTracker::new();
        let tracker2 = tracker1.clone();

        let _guard = tracker1.track();
        assert_eq!(tracker2.count(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_immediate() {
        let tracker = ConnectionTracker::new();
        assert!(tracker.wait_for_shutdown(Duration::from_millis(100)).await);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_drains() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        assert!(tracker.wait_for_shutdown(Duration::from_secs(2)).await);
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_timeout() {
        let tracker = ConnectionTracker::new();
        let _guard = tracker.track();

        assert!(!tracker.wait_for_shutdown(Duration::from_millis(50)).await);
        assert_eq!(tracker.count(), 1);
    }

    // ===========================================
    // ConnectionLimiter tests
    // ===========================================

    #[test]
    fn test_limiter_unlimited() {
        let limiter = ConnectionLimiter::new(0);
        assert_eq!(limiter.max_connections(), 0);
        assert!(matches!(limiter.admit(), Admission::Unlimited));
        assert!(!limiter.admit().is_rejected());
    }

    #[test]
    fn test_limiter_rejects_at_capacity() {
        let limiter = ConnectionLimiter::new(2);

        let first = limiter.admit();
        let second = limiter.admit();
        assert!(matches!(first, Admission::Permitted(_)));
        assert!(matches!(second, Admission::Permitted(_)));

        assert!(limiter.admit().is_rejected());
    }

    #[test]
    fn test_limiter_permit_release() {
        let limiter = ConnectionLimiter::new(1);

        let permit = limiter.admit();
        assert!(limiter.admit().is_rejected());
        drop(permit);

        assert!(!limiter.admit().is_rejected());
    }
}

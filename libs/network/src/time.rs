//! High-performance timestamp source for `ts_server_recv` (§3: every
//! `MarketEvent` carries both the exchange's own send time and the
//! local receive time).
//!
//! Caches the wall clock in an atomic, refreshed by a background task,
//! so stamping an event on the hot decode path is a single atomic load
//! instead of a syscall -- the same tradeoff the reference network
//! stack makes for its own message timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone)]
pub struct CachedClock {
    current_time_ns: Arc<AtomicU64>,
}

impl CachedClock {
    /// Starts the background refresh task. Must be called from within a
    /// tokio runtime; outside one, `now_ns` still returns the value
    /// captured at construction.
    pub fn new(update_interval: Duration) -> Self {
        let clock = Self {
            current_time_ns: Arc::new(AtomicU64::new(Self::fetch_real_time_ns())),
        };
        clock.start_updater(update_interval);
        clock
    }

    pub fn with_default_interval() -> Self {
        Self::new(DEFAULT_UPDATE_INTERVAL)
    }

    #[inline(always)]
    pub fn now_ns(&self) -> u64 {
        self.current_time_ns.load(Ordering::Relaxed)
    }

    fn start_updater(&self, update_interval: Duration) {
        let current = self.current_time_ns.clone();
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(update_interval);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    current.store(Self::fetch_real_time_ns(), Ordering::Relaxed);
                }
            });
        }
    }

    fn fetch_real_time_ns() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ns_is_nonzero_without_a_runtime() {
        let clock = CachedClock::new(Duration::from_millis(1));
        assert!(clock.now_ns() > 0);
    }

    #[tokio::test]
    async fn background_task_advances_the_cached_time() {
        let clock = CachedClock::new(Duration::from_millis(1));
        let initial = clock.now_ns();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(clock.now_ns() >= initial);
    }
}

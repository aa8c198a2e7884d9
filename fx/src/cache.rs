//! USD rate-table cache with a freshness window.
//!
//! The cache holds at most one table: the one returned by the most recent
//! successful fetch. Stale reads trigger a lazy refetch; a failed refetch
//! leaves the previous table (or nothing) in place and is never surfaced to
//! callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use parking_lot::RwLock;
use takehome_common::{constants, epoch, is_within, now, DurationExt, RateTable, Timestamp};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::FxError;
use crate::provider::RateProvider;

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a fetched table is served before it is refetched.
    pub freshness_window: Duration,
    /// Upper bound on a single upstream fetch.
    pub fetch_timeout: StdDuration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: constants::rate_freshness_window(),
            fetch_timeout: constants::rate_fetch_timeout().as_std(),
        }
    }
}

/// A rate table together with the time it was fetched.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    pub rates: Arc<RateTable>,
    /// Unix epoch if no fetch has ever succeeded.
    pub fetched_at: Timestamp,
}

#[derive(Debug)]
struct CacheState {
    rates: Option<Arc<RateTable>>,
    fetched_at: Timestamp,
}

impl CacheState {
    fn fresh(&self, window: Duration) -> Option<RateSnapshot> {
        let rates = self.rates.as_ref()?;
        is_within(self.fetched_at, window).then(|| RateSnapshot {
            rates: Arc::clone(rates),
            fetched_at: self.fetched_at,
        })
    }

    fn fallback(&self) -> RateSnapshot {
        RateSnapshot {
            rates: self
                .rates
                .clone()
                .unwrap_or_else(|| Arc::new(RateTable::new())),
            fetched_at: self.fetched_at,
        }
    }
}

/// Lazily refreshed, process-wide rate table.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    state: RwLock<CacheState>,
    /// Serializes refreshes so concurrent stale readers share one fetch.
    refresh_lock: Mutex<()>,
    /// Completed refresh attempts, successful or not.
    refresh_generation: AtomicU64,
    config: RateCacheConfig,
    hits: AtomicU64,
    fetch_attempts: AtomicU64,
    fetch_successes: AtomicU64,
    fetch_failures: AtomicU64,
}

impl RateCache {
    /// Create an empty cache with default configuration.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_config(provider, RateCacheConfig::default())
    }

    /// Create an empty cache with custom configuration.
    pub fn with_config(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self {
            provider,
            state: RwLock::new(CacheState {
                rates: None,
                fetched_at: epoch(),
            }),
            refresh_lock: Mutex::new(()),
            refresh_generation: AtomicU64::new(0),
            config,
            hits: AtomicU64::new(0),
            fetch_attempts: AtomicU64::new(0),
            fetch_successes: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
        }
    }

    /// Current rate table, refetching first if it is missing or stale.
    ///
    /// Never fails: if the refetch fails the previous table is returned, or an
    /// empty one if there never was a successful fetch.
    pub async fn get_rates(&self) -> Arc<RateTable> {
        self.snapshot().await.rates
    }

    /// Like [`RateCache::get_rates`], also returning when the table was fetched.
    pub async fn snapshot(&self) -> RateSnapshot {
        if let Some(snapshot) = self.fresh() {
            return snapshot;
        }

        let generation = self.refresh_generation.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh() {
            debug!("Rate table refreshed by concurrent caller");
            return snapshot;
        }

        // It may also have tried and failed; its outcome stands for us too.
        if self.refresh_generation.load(Ordering::Acquire) != generation {
            debug!("Concurrent refresh failed, serving previous table");
            return self.state.read().fallback();
        }

        let snapshot = self.refresh().await;
        self.refresh_generation.fetch_add(1, Ordering::Release);
        snapshot
    }

    /// Cached state without any I/O, fresh or not.
    pub fn cached(&self) -> Option<RateSnapshot> {
        let state = self.state.read();
        state.rates.as_ref().map(|rates| RateSnapshot {
            rates: Arc::clone(rates),
            fetched_at: state.fetched_at,
        })
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            fetch_attempts: self.fetch_attempts.load(Ordering::Relaxed),
            fetch_successes: self.fetch_successes.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            cached_currencies: self.state.read().rates.as_ref().map_or(0, |r| r.len()),
        }
    }

    fn fresh(&self) -> Option<RateSnapshot> {
        let snapshot = self.state.read().fresh(self.config.freshness_window)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(snapshot)
    }

    async fn refresh(&self) -> RateSnapshot {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
        let started_at = now();

        let result = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.fetch_latest(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FxError::Timeout(self.config.fetch_timeout.as_millis() as u64)),
        };

        match result {
            Ok(table) => {
                let rates = Arc::new(table);
                {
                    let mut state = self.state.write();
                    state.rates = Some(Arc::clone(&rates));
                    state.fetched_at = started_at;
                }
                self.fetch_successes.fetch_add(1, Ordering::Relaxed);

                info!(
                    provider = self.provider.name(),
                    currencies = rates.len(),
                    "Rate table refreshed"
                );

                RateSnapshot {
                    rates,
                    fetched_at: started_at,
                }
            }
            Err(e) => {
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                let fallback = self.state.read().fallback();

                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    code = e.error_code(),
                    cached_currencies = fallback.rates.len(),
                    "Failed to fetch rates, serving previous table"
                );

                fallback
            }
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub fetch_attempts: u64,
    pub fetch_successes: u64,
    pub fetch_failures: u64,
    pub cached_currencies: usize,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;

    fn table(entries: &[(&str, f64)]) -> RateTable {
        entries.iter().map(|(code, rate)| (*code, *rate)).collect()
    }

    fn short_lived(provider: Arc<MockRateProvider>, window_ms: i64) -> RateCache {
        RateCache::with_config(
            provider,
            RateCacheConfig {
                freshness_window: Duration::milliseconds(window_ms),
                fetch_timeout: StdDuration::from_millis(500),
            },
        )
    }

    #[tokio::test]
    async fn test_second_call_within_window_hits_cache() {
        let provider = Arc::new(MockRateProvider::with_rates("test", table(&[("LKR", 300.0)])));
        let cache = RateCache::new(provider.clone());

        let first = cache.get_rates().await;
        let second = cache.get_rates().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_stale_table_is_refetched_once() {
        let provider = Arc::new(MockRateProvider::with_rates("test", table(&[("LKR", 300.0)])));
        let cache = short_lived(provider.clone(), 50);

        cache.get_rates().await;
        provider.set_rates(table(&[("LKR", 310.0)]));
        tokio::time::sleep(StdDuration::from_millis(60)).await;

        let rates = cache.get_rates().await;

        assert_eq!(rates.get("LKR"), Some(310.0));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_table() {
        let provider = Arc::new(MockRateProvider::with_rates("test", table(&[("LKR", 300.0)])));
        let cache = short_lived(provider.clone(), 50);

        let before = cache.snapshot().await;
        provider.fail();
        tokio::time::sleep(StdDuration::from_millis(60)).await;

        let after = cache.snapshot().await;

        assert_eq!(provider.calls(), 2);
        assert!(Arc::ptr_eq(&before.rates, &after.rates));
        assert_eq!(before.fetched_at, after.fetched_at);
        assert_eq!(cache.stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_failure_without_cache_returns_empty_table() {
        let provider = Arc::new(MockRateProvider::new("down"));
        let cache = RateCache::new(provider.clone());

        let snapshot = cache.snapshot().await;

        assert!(snapshot.rates.is_empty());
        assert_eq!(snapshot.fetched_at, epoch());
        assert!(cache.cached().is_none());

        // Nothing was cached, so the next call tries again.
        cache.get_rates().await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_timeout_degrades_to_empty_table() {
        let provider = Arc::new(MockRateProvider::with_rates("slow", table(&[("LKR", 300.0)])));
        provider.set_delay(StdDuration::from_millis(200));
        let cache = RateCache::with_config(
            provider.clone(),
            RateCacheConfig {
                fetch_timeout: StdDuration::from_millis(20),
                ..Default::default()
            },
        );

        let rates = cache.get_rates().await;

        assert!(rates.is_empty());
        assert_eq!(cache.stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_concurrent_stale_callers_share_one_fetch() {
        let provider = Arc::new(MockRateProvider::with_rates("test", table(&[("EUR", 0.92)])));
        provider.set_delay(StdDuration::from_millis(30));
        let cache = Arc::new(RateCache::new(provider.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_rates().await })
            })
            .collect();

        for handle in handles {
            let rates = handle.await.unwrap();
            assert_eq!(rates.get("EUR"), Some(0.92));
        }

        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failed_fetch() {
        let provider = Arc::new(MockRateProvider::new("down"));
        provider.set_delay(StdDuration::from_millis(100));
        let cache = Arc::new(RateCache::new(provider.clone()));

        let started = std::time::Instant::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_rates().await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_empty());
        }

        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.stats().fetch_failures, 1);
        assert!(started.elapsed() < StdDuration::from_millis(400));

        // A later caller is not part of that round and tries again.
        cache.get_rates().await;
        assert_eq!(provider.calls(), 2);
    }
}

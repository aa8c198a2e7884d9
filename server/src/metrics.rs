//! Request counters exported in Prometheus text format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use takehome_fx::CacheStats;

/// Service metrics.
pub struct Metrics {
    /// Calculate requests that reached the service.
    pub calculations_total: AtomicU64,
    /// Calculations computed and stored.
    pub calculations_success: AtomicU64,
    /// Calculations rejected by validation.
    pub calculations_rejected: AtomicU64,
    /// Calculations lost to a persistence failure.
    pub calculations_failed: AtomicU64,
    /// History reads.
    pub history_requests: AtomicU64,
    /// Currency table reads.
    pub currencies_requests: AtomicU64,
    /// Profile updates applied.
    pub profile_updates: AtomicU64,
    /// Requests rejected for lack of a valid session.
    pub auth_rejections: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            calculations_total: AtomicU64::new(0),
            calculations_success: AtomicU64::new(0),
            calculations_rejected: AtomicU64::new(0),
            calculations_failed: AtomicU64::new(0),
            history_requests: AtomicU64::new(0),
            currencies_requests: AtomicU64::new(0),
            profile_updates: AtomicU64::new(0),
            auth_rejections: AtomicU64::new(0),
        }
    }

    pub fn calculation_initiated(&self) {
        self.calculations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn calculation_success(&self) {
        self.calculations_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn calculation_rejected(&self) {
        self.calculations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn calculation_failed(&self) {
        self.calculations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn history_requested(&self) {
        self.history_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn currencies_requested(&self) {
        self.currencies_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn profile_updated(&self) {
        self.profile_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth_rejected(&self) {
        self.auth_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calculations_total: self.calculations_total.load(Ordering::Relaxed),
            calculations_success: self.calculations_success.load(Ordering::Relaxed),
            calculations_rejected: self.calculations_rejected.load(Ordering::Relaxed),
            calculations_failed: self.calculations_failed.load(Ordering::Relaxed),
            history_requests: self.history_requests.load(Ordering::Relaxed),
            currencies_requests: self.currencies_requests.load(Ordering::Relaxed),
            profile_updates: self.profile_updates.load(Ordering::Relaxed),
            auth_rejections: self.auth_rejections.load(Ordering::Relaxed),
        }
    }

    /// Export metrics, plus rate cache statistics, in Prometheus format.
    pub fn to_prometheus(&self, cache: &CacheStats) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP takehome_calculations_total Calculate requests received
# TYPE takehome_calculations_total counter
takehome_calculations_total {}

# HELP takehome_calculations_success Calculations computed and stored
# TYPE takehome_calculations_success counter
takehome_calculations_success {}

# HELP takehome_calculations_rejected Calculations rejected by validation
# TYPE takehome_calculations_rejected counter
takehome_calculations_rejected {}

# HELP takehome_calculations_failed Calculations that failed to persist
# TYPE takehome_calculations_failed counter
takehome_calculations_failed {}

# HELP takehome_history_requests History reads
# TYPE takehome_history_requests counter
takehome_history_requests {}

# HELP takehome_currencies_requests Currency table reads
# TYPE takehome_currencies_requests counter
takehome_currencies_requests {}

# HELP takehome_profile_updates Profile updates applied
# TYPE takehome_profile_updates counter
takehome_profile_updates {}

# HELP takehome_auth_rejections Requests without a valid session
# TYPE takehome_auth_rejections counter
takehome_auth_rejections {}

# HELP takehome_rate_cache_hits Rate lookups served from cache
# TYPE takehome_rate_cache_hits counter
takehome_rate_cache_hits {}

# HELP takehome_rate_fetch_attempts Upstream rate fetches attempted
# TYPE takehome_rate_fetch_attempts counter
takehome_rate_fetch_attempts {}

# HELP takehome_rate_fetch_failures Upstream rate fetches that failed
# TYPE takehome_rate_fetch_failures counter
takehome_rate_fetch_failures {}

# HELP takehome_rate_cached_currencies Currencies in the cached table
# TYPE takehome_rate_cached_currencies gauge
takehome_rate_cached_currencies {}
"#,
            snapshot.calculations_total,
            snapshot.calculations_success,
            snapshot.calculations_rejected,
            snapshot.calculations_failed,
            snapshot.history_requests,
            snapshot.currencies_requests,
            snapshot.profile_updates,
            snapshot.auth_rejections,
            cache.hits,
            cache.fetch_attempts,
            cache.fetch_failures,
            cache.cached_currencies,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub calculations_total: u64,
    pub calculations_success: u64,
    pub calculations_rejected: u64,
    pub calculations_failed: u64,
    pub history_requests: u64,
    pub currencies_requests: u64,
    pub profile_updates: u64,
    pub auth_rejections: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = Metrics::new();

        metrics.calculation_initiated();
        metrics.calculation_initiated();
        metrics.calculation_success();
        metrics.calculation_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calculations_total, 2);
        assert_eq!(snapshot.calculations_success, 1);
        assert_eq!(snapshot.calculations_rejected, 1);
        assert_eq!(snapshot.calculations_failed, 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.calculation_initiated();

        let cache = CacheStats {
            fetch_attempts: 3,
            cached_currencies: 160,
            ..Default::default()
        };
        let output = metrics.to_prometheus(&cache);

        assert!(output.contains("takehome_calculations_total 1"));
        assert!(output.contains("takehome_rate_fetch_attempts 3"));
        assert!(output.contains("takehome_rate_cached_currencies 160"));
    }
}

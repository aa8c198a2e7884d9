//! FX engine: the rate cache plus earnings arithmetic.

use std::sync::Arc;

use takehome_common::RateTable;
use tracing::{debug, instrument};

use crate::cache::{CacheStats, RateCache, RateSnapshot, SharedRateCache};
use crate::conversion::EarningsBreakdown;

/// Entry point for rate lookups and earnings conversion.
#[derive(Clone)]
pub struct FxEngine {
    cache: SharedRateCache,
}

impl FxEngine {
    /// Create an engine over a shared rate cache.
    pub fn new(cache: SharedRateCache) -> Self {
        Self { cache }
    }

    /// Current rate table (see [`RateCache::get_rates`]).
    pub async fn rates(&self) -> Arc<RateTable> {
        self.cache.get_rates().await
    }

    /// Current rate table and its fetch time.
    pub async fn snapshot(&self) -> RateSnapshot {
        self.cache.snapshot().await
    }

    /// Fee/conversion breakdown of `project_price` USD into `target_currency`.
    #[instrument(skip(self))]
    pub async fn earnings(&self, project_price: f64, target_currency: &str) -> EarningsBreakdown {
        let rates = self.cache.get_rates().await;

        if !rates.contains(target_currency) {
            debug!(target_currency, "Currency not in rate table, converting at 1.0");
        }

        EarningsBreakdown::compute(project_price, target_currency, &rates)
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

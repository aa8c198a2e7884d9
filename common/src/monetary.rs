//! Exchange-rate table and earnings constants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base currency every rate in a [`RateTable`] is quoted against.
pub const BASE_CURRENCY: &str = "USD";

/// Share of the project price kept by the platform.
pub const PLATFORM_FEE_RATE: f64 = 0.20;

/// Rate applied when the target currency is missing from the table.
pub const FALLBACK_RATE: f64 = 1.0;

/// Maximum number of calculations returned by a history query.
pub const HISTORY_LIMIT: i64 = 10;

/// Currency code to "units of that currency per 1 USD".
///
/// A table is always replaced as a whole; there is no API to merge two tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(BTreeMap<String, f64>);

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a table from upstream entries, keeping only finite positive rates.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(code, rate)| (code.into(), rate))
                .filter(|(_, rate)| is_usable_rate(*rate))
                .collect(),
        )
    }

    /// Look up the rate for a currency code.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    /// Rate for a currency, or [`FALLBACK_RATE`] when it is unknown or unusable.
    pub fn rate_or_fallback(&self, code: &str) -> f64 {
        self.get(code)
            .filter(|rate| is_usable_rate(*rate))
            .unwrap_or(FALLBACK_RATE)
    }

    /// Whether the table contains a currency.
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    /// Currency codes in the table, sorted.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self::from_entries(iter)
    }
}

fn is_usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

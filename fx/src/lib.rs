//! TakeHome FX Engine
//!
//! Exchange-rate caching and earnings conversion.
//!
//! # Features
//!
//! - Pluggable rate providers (HTTP provider for open.er-api.com)
//! - Single rate table cached for a freshness window, refreshed lazily
//! - Fetch failures degrade to the last good table instead of erroring
//! - Fee deduction and conversion of a USD project price
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use takehome_fx::{FxEngine, HttpRateProvider, RateCache, DEFAULT_RATES_URL};
//!
//! let provider = HttpRateProvider::new(DEFAULT_RATES_URL, Duration::from_secs(5))?;
//! let engine = FxEngine::new(Arc::new(RateCache::new(Arc::new(provider))));
//!
//! let breakdown = engine.earnings(150.0, "LKR").await;
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod conversion;
pub mod error;

pub use engine::FxEngine;
pub use provider::{HttpRateProvider, RateProvider, DEFAULT_RATES_URL};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
pub use cache::{CacheStats, RateCache, RateCacheConfig, RateSnapshot, SharedRateCache};
pub use conversion::EarningsBreakdown;
pub use error::{FxError, FxResult};

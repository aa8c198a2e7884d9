//! Shared application state.

use std::sync::Arc;

use takehome_fx::FxEngine;
use takehome_ledger::Storage;

use crate::config::ServerConfig;
use crate::metrics::{Metrics, SharedMetrics};
use crate::service::CalculationService;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub config: ServerConfig,
    pub fx: FxEngine,
    pub storage: Arc<dyn Storage>,
    pub service: CalculationService,
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(config: ServerConfig, fx: FxEngine, storage: Arc<dyn Storage>) -> Arc<Self> {
        let metrics = Arc::new(Metrics::new());
        let service = CalculationService::new(fx.clone(), Arc::clone(&storage), Arc::clone(&metrics));

        Arc::new(Self {
            config,
            fx,
            storage,
            service,
            metrics,
        })
    }
}

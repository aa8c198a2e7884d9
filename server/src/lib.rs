//! TakeHome Server
//!
//! HTTP service that turns a freelance project price into take-home earnings
//! in the caller's currency and keeps a short history of past calculations.
//!
//! # Routes
//!
//! - `GET /api/currencies`: cached USD rate table (public)
//! - `POST /api/calculate`: fee and conversion breakdown, recorded per user
//! - `GET /api/history`: the caller's ten most recent calculations
//! - `PATCH /api/user/profile`: edit first/last name
//! - `GET /api/auth/user`: the signed-in user
//! - `GET /health`, `GET /metrics`

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod service;
pub mod state;

pub use auth::AuthenticatedUser;
pub use config::ServerConfig;
pub use error::ApiError;
pub use metrics::Metrics;
pub use routes::router;
pub use service::CalculationService;
pub use state::AppState;

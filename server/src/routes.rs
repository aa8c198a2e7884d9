//! HTTP routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{middleware, Extension, Json, Router};
use serde::Serialize;
use serde_json::Value;
use takehome_common::{epoch, to_iso_millis, RateTable, TakeHomeError};
use takehome_fx::EarningsBreakdown;
use takehome_ledger::{CalculationRecord, ProfileUpdate, User};
use tower_http::trace::TraceLayer;

use crate::auth::{require_session, AuthenticatedUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /api/currencies`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrenciesResponse {
    pub rates: Arc<RateTable>,
    pub last_update: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub rates_cached: bool,
    pub last_update: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/calculate", post(calculate))
        .route("/api/history", get(history))
        .route("/api/user/profile", patch(update_profile))
        .route("/api/auth/user", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));

    Router::new()
        .route("/api/currencies", get(currencies))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn currencies(State(state): State<Arc<AppState>>) -> Json<CurrenciesResponse> {
    state.metrics.currencies_requested();
    let snapshot = state.fx.snapshot().await;

    Json(CurrenciesResponse {
        rates: snapshot.rates,
        last_update: to_iso_millis(snapshot.fetched_at),
    })
}

async fn calculate(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<EarningsBreakdown>, ApiError> {
    let Json(body) = body.map_err(invalid_body)?;
    let breakdown = state.service.calculate(&user_id, &body).await?;
    Ok(Json(breakdown))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<CalculationRecord>>, ApiError> {
    let records = state.service.history(&user_id).await?;
    Ok(Json(records))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(body) = body.map_err(invalid_body)?;
    let update: ProfileUpdate = serde_json::from_value(body)
        .map_err(|_| TakeHomeError::validation("firstName and lastName must be strings"))?;

    let user = state
        .service
        .update_profile(&user_id, &update)
        .await
        .map_err(|e| ApiError::from(e).with_public_message("Failed to update profile"))?;

    Ok(Json(user))
}

async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .service
        .current_user(&user_id)
        .await
        .map_err(|e| ApiError::from(e).with_public_message("Failed to fetch user"))?;

    Ok(Json(user))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cached = state.fx.cache().cached();

    Json(HealthResponse {
        status: "ok",
        rates_cached: cached.is_some(),
        last_update: to_iso_millis(cached.map_or_else(epoch, |snapshot| snapshot.fetched_at)),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(&state.fx.stats()),
    )
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    TakeHomeError::validation(rejection.body_text()).into()
}

//! Calculation service: validation, conversion and the audit record.

use std::sync::Arc;

use serde_json::Value;
use takehome_common::{Result, TakeHomeError, UserId, HISTORY_LIMIT};
use takehome_fx::{EarningsBreakdown, FxEngine};
use takehome_ledger::{CalculationRecord, NewCalculation, ProfileUpdate, Storage, User};
use tracing::{info, instrument, warn};

use crate::metrics::SharedMetrics;

/// A validated calculate request.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculateRequest {
    /// Project price in USD, `>= 0`.
    pub amount: f64,
    /// Non-empty currency code.
    pub target_currency: String,
}

impl CalculateRequest {
    /// Validate a JSON body, reporting the first offending field.
    pub fn from_json(body: &Value) -> Result<Self> {
        let fields = body
            .as_object()
            .ok_or_else(|| TakeHomeError::validation("Request body must be a JSON object"))?;

        let amount = match fields.get("amount") {
            None => return Err(TakeHomeError::validation("amount is required")),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| TakeHomeError::validation("amount must be a number"))?,
        };
        if amount < 0.0 {
            return Err(TakeHomeError::validation(
                "amount must be greater than or equal to 0",
            ));
        }

        let target_currency = match fields.get("targetCurrency") {
            None => return Err(TakeHomeError::validation("targetCurrency is required")),
            Some(Value::String(code)) if code.is_empty() => {
                return Err(TakeHomeError::validation("targetCurrency must not be empty"))
            }
            Some(Value::String(code)) => code.clone(),
            Some(_) => return Err(TakeHomeError::validation("targetCurrency must be a string")),
        };

        Ok(Self {
            amount,
            target_currency,
        })
    }
}

/// Earnings calculation, history and profile operations for signed-in users.
#[derive(Clone)]
pub struct CalculationService {
    fx: FxEngine,
    storage: Arc<dyn Storage>,
    metrics: SharedMetrics,
}

impl CalculationService {
    pub fn new(fx: FxEngine, storage: Arc<dyn Storage>, metrics: SharedMetrics) -> Self {
        Self {
            fx,
            storage,
            metrics,
        }
    }

    /// Validate `body`, compute the breakdown and append it to the user's history.
    ///
    /// Nothing is looked up or stored when validation fails. A storage failure
    /// fails the call; the computed breakdown is discarded.
    #[instrument(skip(self, user_id, body), fields(user_id = %user_id))]
    pub async fn calculate(&self, user_id: &UserId, body: &Value) -> Result<EarningsBreakdown> {
        self.metrics.calculation_initiated();

        let request = CalculateRequest::from_json(body).map_err(|e| {
            self.metrics.calculation_rejected();
            e
        })?;

        let breakdown = self
            .fx
            .earnings(request.amount, &request.target_currency)
            .await;

        if !breakdown.is_finite() {
            self.metrics.calculation_rejected();
            warn!(amount = request.amount, "Calculation overflowed, not recorded");
            return Err(TakeHomeError::validation("amount is too large"));
        }

        let record = self
            .storage
            .create_calculation(NewCalculation {
                user_id: user_id.clone(),
                project_price: breakdown.project_price,
                fee_amount: breakdown.fee_amount,
                take_home_usd: breakdown.take_home_usd,
                target_currency: breakdown.target_currency.clone(),
                exchange_rate: breakdown.exchange_rate,
                final_amount: breakdown.final_amount,
            })
            .await
            .map_err(|e| {
                self.metrics.calculation_failed();
                warn!(error = %e, "Calculation could not be stored");
                e
            })?;

        self.metrics.calculation_success();
        info!(
            calculation_id = %record.id,
            target_currency = %record.target_currency,
            exchange_rate = record.exchange_rate,
            "Calculation recorded"
        );

        Ok(breakdown)
    }

    /// The user's most recent calculations, newest first.
    pub async fn history(&self, user_id: &UserId) -> Result<Vec<CalculationRecord>> {
        self.metrics.history_requested();
        self.storage.history(user_id, HISTORY_LIMIT).await
    }

    /// Apply a profile edit after validating it.
    #[instrument(skip(self, user_id, update), fields(user_id = %user_id))]
    pub async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<User> {
        update.validate()?;

        let user = self.storage.update_profile(user_id, update).await?;
        self.metrics.profile_updated();
        info!("Profile updated");

        Ok(user)
    }

    /// The signed-in user's profile.
    pub async fn current_user(&self, user_id: &UserId) -> Result<User> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| TakeHomeError::NotFound(format!("user {}", user_id)))
    }
}

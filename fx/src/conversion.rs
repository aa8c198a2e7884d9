//! Fee deduction and currency conversion of a project price.

use serde::{Deserialize, Serialize};
use takehome_common::{RateTable, PLATFORM_FEE_RATE};

/// Fee/conversion breakdown of a project price quoted in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsBreakdown {
    /// Price the client pays, in USD.
    pub project_price: f64,
    /// Platform fee, in USD.
    pub fee_amount: f64,
    /// Price minus fee, in USD.
    #[serde(rename = "takeHomeUSD")]
    pub take_home_usd: f64,
    /// Currency the take-home was converted to.
    pub target_currency: String,
    /// Units of `target_currency` per USD used for the conversion.
    pub exchange_rate: f64,
    /// Take-home in `target_currency`.
    pub final_amount: f64,
}

impl EarningsBreakdown {
    /// Compute the breakdown using the rate for `target_currency` in `rates`.
    ///
    /// A currency missing from the table converts at 1.0.
    pub fn compute(project_price: f64, target_currency: impl Into<String>, rates: &RateTable) -> Self {
        let target_currency = target_currency.into();
        let exchange_rate = rates.rate_or_fallback(&target_currency);
        Self::at_rate(project_price, target_currency, exchange_rate)
    }

    /// Compute the breakdown at an explicit rate.
    pub fn at_rate(project_price: f64, target_currency: impl Into<String>, exchange_rate: f64) -> Self {
        let fee_amount = project_price * PLATFORM_FEE_RATE;
        let take_home_usd = project_price - fee_amount;
        let final_amount = take_home_usd * exchange_rate;

        Self {
            project_price,
            fee_amount,
            take_home_usd,
            target_currency: target_currency.into(),
            exchange_rate,
            final_amount,
        }
    }

    /// Whether every amount is finite. Prices near `f64::MAX` overflow once
    /// converted at a rate above 1.
    pub fn is_finite(&self) -> bool {
        [
            self.project_price,
            self.fee_amount,
            self.take_home_usd,
            self.exchange_rate,
            self.final_amount,
        ]
        .iter()
        .all(|amount| amount.is_finite())
    }
}

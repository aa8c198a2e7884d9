//! Calculation history records.

use serde::{Deserialize, Serialize};
use takehome_common::{CalculationId, Timestamp, UserId};

/// A persisted calculation. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub user_id: UserId,
    pub project_price: f64,
    pub fee_amount: f64,
    #[serde(rename = "takeHomeUSD")]
    pub take_home_usd: f64,
    pub target_currency: String,
    pub exchange_rate: f64,
    pub final_amount: f64,
    pub created_at: Timestamp,
}

/// A calculation about to be appended; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculation {
    pub user_id: UserId,
    pub project_price: f64,
    pub fee_amount: f64,
    pub take_home_usd: f64,
    pub target_currency: String,
    pub exchange_rate: f64,
    pub final_amount: f64,
}

impl NewCalculation {
    /// Attach the store-assigned identity.
    pub fn into_record(self, id: CalculationId, created_at: Timestamp) -> CalculationRecord {
        CalculationRecord {
            id,
            user_id: self.user_id,
            project_price: self.project_price,
            fee_amount: self.fee_amount,
            take_home_usd: self.take_home_usd,
            target_currency: self.target_currency,
            exchange_rate: self.exchange_rate,
            final_amount: self.final_amount,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use takehome_common::epoch;

    #[test]
    fn test_record_json_shape() {
        let record = NewCalculation {
            user_id: UserId::new("u1"),
            project_price: 150.0,
            fee_amount: 30.0,
            take_home_usd: 120.0,
            target_currency: "LKR".to_string(),
            exchange_rate: 300.0,
            final_amount: 36000.0,
        }
        .into_record(CalculationId::new(1), epoch());

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["takeHomeUSD"], 120.0);
        assert_eq!(json["targetCurrency"], "LKR");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
    }
}

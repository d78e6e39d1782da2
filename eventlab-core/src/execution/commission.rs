//! Per-share commission with a minimum ticket fee.

use serde::{Deserialize, Serialize};

/// `commission = max(minimum_fee, per_share_fee × quantity)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionModel {
    pub minimum_fee: f64,
    pub per_share_fee: f64,
}

impl Default for CommissionModel {
    fn default() -> Self {
        Self {
            minimum_fee: 1.0,
            per_share_fee: 0.005,
        }
    }
}

impl CommissionModel {
    pub fn new(minimum_fee: f64, per_share_fee: f64) -> Self {
        Self {
            minimum_fee,
            per_share_fee,
        }
    }

    /// A model that charges nothing.
    pub fn free() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn compute(&self, quantity: u64) -> f64 {
        self.minimum_fee.max(self.per_share_fee * quantity as f64)
    }
}

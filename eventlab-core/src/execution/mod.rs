//! Execution: turn orders into fills.
//!
//! - **Commission**: `max(minimum_fee, per_share_fee × quantity)`
//! - **Slippage**: optional adverse price shift on market orders
//! - **Liquidity**: optional participation cap against bar volume
//! - **Rejection**: an unfillable order yields no fill, never an error

pub mod commission;
pub mod liquidity;
pub mod simulated;
pub mod slippage;

pub use commission::CommissionModel;
pub use liquidity::LiquidityConstraint;
pub use simulated::{RejectReason, RejectionCounts, SimulatedExecutionHandler};
pub use slippage::{NoSlippage, PercentSlippage, SlippageModel};

use crate::data::DataHandler;
use crate::domain::{FillEvent, OrderEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broker contract: zero or one fill per order.
pub trait ExecutionHandler: Send {
    fn execute_order(&mut self, order: &OrderEvent, data: &dyn DataHandler) -> Option<FillEvent>;

    /// Rejections by reason, for handlers that track them.
    fn rejection_counts(&self) -> Option<RejectionCounts> {
        None
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error(
        "commission fees must be non-negative (minimum_fee={minimum_fee}, per_share_fee={per_share_fee})"
    )]
    NegativeFee { minimum_fee: f64, per_share_fee: f64 },

    #[error("slippage_pct must be in [0, 1), got {0}")]
    Slippage(f64),

    #[error("max_volume_participation must be in (0, 1], got {0}")]
    Participation(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Venue label stamped on every fill.
    pub venue: String,
    pub commission: CommissionModel,
    /// Adverse price shift for market orders (0.0005 = 5 bps).
    pub slippage_pct: f64,
    /// Reject orders larger than this share of bar volume.
    pub max_volume_participation: Option<f64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            venue: "SIMULATED".to_string(),
            commission: CommissionModel::default(),
            slippage_pct: 0.0,
            max_volume_participation: None,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ExecutionError> {
        let c = self.commission;
        let valid_fee = |fee: f64| fee.is_finite() && fee >= 0.0;
        if !valid_fee(c.minimum_fee) || !valid_fee(c.per_share_fee) {
            return Err(ExecutionError::NegativeFee {
                minimum_fee: c.minimum_fee,
                per_share_fee: c.per_share_fee,
            });
        }
        if !(0.0..1.0).contains(&self.slippage_pct) {
            return Err(ExecutionError::Slippage(self.slippage_pct));
        }
        if let Some(rate) = self.max_volume_participation {
            if LiquidityConstraint::new(rate).is_none() {
                return Err(ExecutionError::Participation(rate));
            }
        }
        Ok(())
    }
}

//! Simulated broker: fills against the latest revealed bar.
//!
//! Market orders fill at the close of the bar that produced the signal,
//! shifted by the slippage model. Limit orders fill at the close when it is
//! at or through the limit, with no slippage. Anything that cannot be
//! filled is rejected: no fill is produced, a warning is logged and the
//! reason is counted.

use super::commission::CommissionModel;
use super::liquidity::LiquidityConstraint;
use super::slippage::{NoSlippage, PercentSlippage, SlippageModel};
use super::{ExecutionConfig, ExecutionError, ExecutionHandler};
use crate::data::DataHandler;
use crate::domain::{Direction, FillEvent, OrderEvent, OrderType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an order produced no fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ZeroQuantity,
    NoBar,
    InsufficientLiquidity,
    LimitNotReached,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectReason::ZeroQuantity => "zero quantity",
            RejectReason::NoBar => "no revealed bar",
            RejectReason::InsufficientLiquidity => "insufficient liquidity",
            RejectReason::LimitNotReached => "limit not reached",
        })
    }
}

/// Rejections by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub zero_quantity: usize,
    pub no_bar: usize,
    pub insufficient_liquidity: usize,
    pub limit_not_reached: usize,
}

impl RejectionCounts {
    fn record(&mut self, reason: RejectReason) {
        let slot = match reason {
            RejectReason::ZeroQuantity => &mut self.zero_quantity,
            RejectReason::NoBar => &mut self.no_bar,
            RejectReason::InsufficientLiquidity => &mut self.insufficient_liquidity,
            RejectReason::LimitNotReached => &mut self.limit_not_reached,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.zero_quantity + self.no_bar + self.insufficient_liquidity + self.limit_not_reached
    }
}

pub struct SimulatedExecutionHandler {
    venue: String,
    commission: CommissionModel,
    slippage: Box<dyn SlippageModel>,
    liquidity: Option<LiquidityConstraint>,
    rejections: RejectionCounts,
}

impl fmt::Debug for SimulatedExecutionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedExecutionHandler")
            .field("venue", &self.venue)
            .field("commission", &self.commission)
            .field("slippage", &self.slippage.name())
            .field("liquidity", &self.liquidity)
            .field("rejections", &self.rejections)
            .finish()
    }
}

impl Default for SimulatedExecutionHandler {
    fn default() -> Self {
        Self {
            venue: ExecutionConfig::default().venue,
            commission: CommissionModel::default(),
            slippage: Box::new(NoSlippage),
            liquidity: None,
            rejections: RejectionCounts::default(),
        }
    }
}

impl SimulatedExecutionHandler {
    pub fn new(config: &ExecutionConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        let slippage: Box<dyn SlippageModel> = if config.slippage_pct > 0.0 {
            Box::new(PercentSlippage::new(config.slippage_pct))
        } else {
            Box::new(NoSlippage)
        };
        let liquidity = match config.max_volume_participation {
            Some(rate) => Some(
                LiquidityConstraint::new(rate).ok_or(ExecutionError::Participation(rate))?,
            ),
            None => None,
        };
        Ok(Self {
            venue: config.venue.clone(),
            commission: config.commission,
            slippage,
            liquidity,
            rejections: RejectionCounts::default(),
        })
    }

    /// Replace the slippage model.
    pub fn with_slippage(mut self, model: impl SlippageModel + 'static) -> Self {
        self.slippage = Box::new(model);
        self
    }

    pub fn rejections(&self) -> RejectionCounts {
        self.rejections
    }

    fn try_fill(&self, order: &OrderEvent, data: &dyn DataHandler) -> Result<FillEvent, RejectReason> {
        if order.quantity == 0 {
            return Err(RejectReason::ZeroQuantity);
        }
        let bar = data
            .get_latest_bar(&order.symbol)
            .map_err(|_| RejectReason::NoBar)?;
        if let Some(lc) = self.liquidity {
            if !lc.can_fill_completely(order.quantity, bar.volume) {
                return Err(RejectReason::InsufficientLiquidity);
            }
        }

        let price = match (order.order_type, order.direction) {
            (OrderType::Market, direction) => self.slippage.adjust(bar.close, direction),
            (OrderType::Limit { price: limit }, Direction::Buy) if bar.close <= limit => {
                bar.close.min(limit)
            }
            (OrderType::Limit { price: limit }, Direction::Sell) if bar.close >= limit => {
                bar.close.max(limit)
            }
            (OrderType::Limit { .. }, _) => return Err(RejectReason::LimitNotReached),
        };

        Ok(FillEvent {
            timestamp: bar.timestamp,
            symbol: order.symbol.clone(),
            venue: self.venue.clone(),
            quantity: order.quantity,
            direction: order.direction,
            fill_cost: price * order.quantity as f64,
            commission: self.commission.compute(order.quantity),
        })
    }
}

impl ExecutionHandler for SimulatedExecutionHandler {
    fn execute_order(&mut self, order: &OrderEvent, data: &dyn DataHandler) -> Option<FillEvent> {
        match self.try_fill(order, data) {
            Ok(fill) => {
                tracing::debug!(
                    symbol = %fill.symbol,
                    direction = %fill.direction,
                    quantity = fill.quantity,
                    price = fill.price(),
                    commission = fill.commission,
                    "order filled"
                );
                Some(fill)
            }
            Err(reason) => {
                self.rejections.record(reason);
                tracing::warn!(
                    symbol = %order.symbol,
                    direction = %order.direction,
                    quantity = order.quantity,
                    %reason,
                    "order rejected"
                );
                None
            }
        }
    }

    fn rejection_counts(&self) -> Option<RejectionCounts> {
        Some(self.rejections)
    }
}

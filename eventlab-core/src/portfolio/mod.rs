//! Portfolio: positions, cash and mark-to-market holdings.
//!
//! Only the portfolio mutates positions, and only in response to fills.

pub mod equity;
pub mod holdings;
pub mod naive;

pub use equity::{EquityCurve, EquityPoint};
pub use holdings::HoldingsSnapshot;
pub use naive::NaivePortfolio;

use crate::analytics::{AnalyticsConfig, PerformanceSummary};
use crate::data::DataHandler;
use crate::domain::{FillEvent, MarketEvent, OrderEvent, SignalEvent};
use serde::{Deserialize, Serialize};

/// What to do with a BUY that cash cannot cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashPolicy {
    /// Let cash go negative (unlimited margin).
    #[default]
    AllowNegative,
    /// Refuse the order when estimated cost plus commission exceeds cash.
    RejectInsufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Fixed lot size for entries, in shares.
    pub order_size: u64,
    pub cash_policy: CashPolicy,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            order_size: 100,
            cash_policy: CashPolicy::AllowNegative,
        }
    }
}

/// Portfolio contract driven by the backtest loop.
pub trait Portfolio: Send {
    /// Snapshot positions and holdings at the newly revealed step.
    ///
    /// Called for every market event before any signal, order or fill it
    /// triggers, so each snapshot reflects pre-trade state for that bar.
    fn update_timeindex(&mut self, event: &MarketEvent, data: &dyn DataHandler);

    /// Size a signal into an order, or decline it.
    fn update_signal(&mut self, signal: &SignalEvent) -> Option<OrderEvent>;

    /// Apply a fill to positions, cash and commission.
    fn update_fill(&mut self, fill: &FillEvent);

    /// Live holdings, including fills since the last snapshot.
    fn current_holdings(&self) -> HoldingsSnapshot;

    /// Append-only snapshot history, one row per step plus the initial row.
    fn history(&self) -> &[HoldingsSnapshot];

    fn create_equity_curve(&self) -> EquityCurve;

    /// Signals refused by a cash policy.
    fn rejected_signals(&self) -> usize {
        0
    }

    fn output_summary_stats(&self, config: &AnalyticsConfig) -> PerformanceSummary {
        PerformanceSummary::from_curve(&self.create_equity_curve(), config)
    }
}

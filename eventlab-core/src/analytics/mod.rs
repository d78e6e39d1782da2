//! Performance analytics: pure functions over an equity curve.

pub mod drawdown;
pub mod metrics;
pub mod summary;

pub use drawdown::{drawdowns, DrawdownSeries};
pub use metrics::{
    annualized_volatility, cagr, period_returns, sharpe_ratio, sortino_ratio, total_return,
};
pub use summary::{PerformanceSummary, UNDEFINED};

use serde::{Deserialize, Serialize};

/// Annualization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Return periods per year (252 for daily bars).
    pub periods_per_year: f64,
    /// Annual risk-free rate as a fraction.
    pub risk_free_rate: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

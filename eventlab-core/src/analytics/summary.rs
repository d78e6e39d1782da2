//! Aggregate performance summary for one run.

use super::drawdown::drawdowns;
use super::metrics::{
    annualized_volatility, cagr, period_returns, sharpe_ratio, sortino_ratio, total_return,
};
use super::AnalyticsConfig;
use crate::portfolio::EquityCurve;
use serde::{Deserialize, Serialize};

/// Rendered in place of values that are undefined for the series.
pub const UNDEFINED: &str = "undefined";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: Option<f64>,
    pub cagr: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub final_equity: Option<f64>,
    /// Number of equity observations.
    pub periods: usize,
}

impl PerformanceSummary {
    /// Compute every statistic from a raw equity series.
    pub fn from_equity(equity: &[f64], config: &AnalyticsConfig) -> Self {
        let ppy = config.periods_per_year;
        let returns = period_returns(equity);
        let dd = drawdowns(equity);
        Self {
            total_return: total_return(equity),
            cagr: cagr(equity, ppy),
            annualized_volatility: annualized_volatility(&returns, ppy),
            sharpe: sharpe_ratio(&returns, config.risk_free_rate, ppy),
            sortino: sortino_ratio(&returns, config.risk_free_rate, ppy),
            max_drawdown: dd.max_drawdown,
            max_drawdown_duration: dd.max_duration,
            final_equity: equity.last().copied(),
            periods: equity.len(),
        }
    }

    pub fn from_curve(curve: &EquityCurve, config: &AnalyticsConfig) -> Self {
        Self::from_equity(&curve.totals(), config)
    }

    /// `(label, formatted value)` pairs in report order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Return", percent(self.total_return)),
            ("CAGR", percent(self.cagr)),
            ("Annualized Volatility", percent(self.annualized_volatility)),
            ("Sharpe Ratio", ratio(self.sharpe)),
            ("Sortino Ratio", ratio(self.sortino)),
            ("Max Drawdown", percent(Some(self.max_drawdown))),
            ("Drawdown Duration", self.max_drawdown_duration.to_string()),
            ("Final Equity", money(self.final_equity)),
            ("Periods", self.periods.to_string()),
        ]
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{v:.2}"))
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| format!("{v:.2}"))
}

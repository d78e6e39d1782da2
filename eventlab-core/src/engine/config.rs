//! Everything needed to assemble one backtest from CSV data.

use crate::analytics::AnalyticsConfig;
use crate::data::LoadWindow;
use crate::execution::ExecutionConfig;
use crate::portfolio::PortfolioConfig;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Directory holding one `{SYMBOL}.csv` per symbol.
    pub csv_dir: PathBuf,
    /// Symbols to load, in configuration order.
    pub symbols: Vec<String>,
    /// Starting cash; must be positive.
    pub initial_capital: f64,
    /// Timestamp of the initial holdings row. Must not be after the first
    /// bar.
    ///
    /// When unset it defaults to the first bar, so the initial row and the
    /// first bar's (pre-trade) snapshot share a timestamp: the equity curve
    /// holds two rows for that instant and the first period return is 0.
    /// Set a strictly earlier start to keep timestamps unique.
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub window: LoadWindow,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl BacktestConfig {
    pub fn new(csv_dir: impl Into<PathBuf>, symbols: Vec<String>, initial_capital: f64) -> Self {
        Self {
            csv_dir: csv_dir.into(),
            symbols,
            initial_capital,
            start: None,
            window: LoadWindow::default(),
            portfolio: PortfolioConfig::default(),
            execution: ExecutionConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

//! Backtest runner: wires a [`RunConfig`] into a core backtest.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads the CSV files, then runs. Used by the CLI.
//! - `run_with_data()`: takes an already-loaded handler (or a replay fork of
//!   one). Used by the parameter sweep.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eventlab_core::analytics::PerformanceSummary;
use eventlab_core::data::HistoricalCsvDataHandler;
use eventlab_core::engine::{Backtest, BacktestError, CancelToken, RunReport};
use eventlab_core::portfolio::EquityCurve;

use crate::config::{ConfigError, RunConfig, RunId};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub config: RunConfig,
    /// BLAKE3 fingerprint of the input files.
    pub dataset_hash: String,
    pub report: RunReport,
    pub summary: PerformanceSummary,
    pub equity_curve: EquityCurve,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the configured CSV files into a handler.
pub fn load_data(config: &RunConfig) -> Result<HistoricalCsvDataHandler, RunError> {
    config.validate()?;
    let handler = HistoricalCsvDataHandler::with_window(
        &config.data.csv_dir,
        &config.data.symbols,
        config.window()?,
    )
    .map_err(BacktestError::from)?;
    Ok(handler)
}

/// Load data and run one backtest to completion.
pub fn run_single_backtest(config: &RunConfig) -> Result<BacktestResult, RunError> {
    let data = load_data(config)?;
    run_with_data(config, data, None)
}

/// Run one backtest over pre-loaded data. No file I/O.
///
/// `data` should be at step 0; pass `handler.fresh_replay()` to reuse a
/// loaded handler.
pub fn run_with_data(
    config: &RunConfig,
    data: HistoricalCsvDataHandler,
    cancel: Option<CancelToken>,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id()?;
    let dataset_hash = data.dataset_hash().to_string();
    let strategy = config.strategy.build().map_err(ConfigError::from)?;
    let strategy_name = config.strategy.label();

    let mut backtest = Backtest::with_data(data, &config.to_backtest_config()?, strategy)?;
    if let Some(token) = cancel {
        backtest = backtest.with_cancel_token(token);
    }

    let span = tracing::info_span!("run", run_id = %&run_id[..12], strategy = %strategy_name);
    let _guard = span.enter();
    let output = backtest.simulate_trading();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: strategy_name,
        config: config.clone(),
        dataset_hash,
        report: output.report,
        summary: output.summary,
        equity_curve: output.equity_curve,
    })
}

//! EventLab Runner: run configuration, single runs, sweeps, artifacts.
//!
//! This crate builds on `eventlab-core` to provide:
//! - TOML run configuration with validation and content-hash run ids
//! - Single-backtest runner returning a serializable result
//! - Parallel moving-average parameter sweep over one loaded dataset
//! - Artifact export (JSON manifest, equity CSV, Markdown report)

pub mod config;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, RunConfig, RunId, StrategyConfig};
pub use export::{load_artifacts, save_artifacts};
pub use runner::{load_data, run_single_backtest, run_with_data, BacktestResult, RunError};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};

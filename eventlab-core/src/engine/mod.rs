//! Backtest orchestration: the single-threaded, per-bar event loop.
//!
//! Each run owns its queue, data handler, portfolio and execution handler.
//! Nothing mutable is shared between runs, so independent runs can execute
//! on separate threads.

pub mod backtest;
pub mod cancel;
pub mod config;
pub mod queue;
pub mod state;

pub use backtest::{Backtest, BacktestOutput};
pub use cancel::CancelToken;
pub use config::BacktestConfig;
pub use queue::EventQueue;
pub use state::{RunOutcome, RunReport, RunState, RunStats};

use crate::data::DataError;
use crate::execution::ExecutionError;
use crate::strategy::StrategyError;
use thiserror::Error;

/// Failures that stop a run from starting. None can occur mid-run.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("configuration error: {0}")]
    Configuration(#[from] DataError),

    #[error("invalid execution config: {0}")]
    Execution(#[from] ExecutionError),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("invalid backtest config: {0}")]
    InvalidConfig(String),
}

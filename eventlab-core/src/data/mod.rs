//! Market data: CSV loading, calendar alignment, and the data handler contract.
//!
//! The [`DataHandler`] is the only window strategies and the portfolio have
//! onto prices. It reveals bars one synchronized step at a time and never
//! exposes a bar ahead of the current step.

pub mod align;
pub mod cache;
pub mod historical_csv;
pub mod loader;

pub use align::{align_symbols, AlignedData};
pub use cache::{CachedSeries, SeriesCache};
pub use historical_csv::{HistoricalCsvDataHandler, LoadWindow};
pub use loader::{load_csv, parse_csv, parse_timestamp, REQUIRED_COLUMNS};

use crate::domain::{Bar, BarField};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by data loading and by latest-bar lookups.
///
/// Everything except [`DataError::UnknownSymbol`] and [`DataError::NoBarsYet`]
/// is a configuration failure raised while constructing a data handler,
/// before any event is emitted.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no symbols configured")]
    NoSymbols,

    #[error("data file for '{symbol}' not found: {}", .path.display())]
    MissingFile { symbol: String, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}: line {line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{}: duplicate timestamp {timestamp}", .path.display())]
    DuplicateTimestamp {
        path: PathBuf,
        timestamp: NaiveDateTime,
    },

    #[error("no bars for '{symbol}' after loading")]
    EmptySeries { symbol: String },

    #[error("symbol '{0}' is not available in the historical data set")]
    UnknownSymbol(String),

    #[error("no bars revealed yet for '{0}'")]
    NoBarsYet(String),
}

impl DataError {
    /// True for failures that must abort a run before it starts.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, DataError::UnknownSymbol(_) | DataError::NoBarsYet(_))
    }
}

/// Supplies synchronized, non-lookahead bar sequences per symbol.
///
/// Readers only ever see bars already revealed by [`DataHandler::update_bars`].
/// Strategies and portfolios receive `&dyn DataHandler`, so they cannot
/// advance the feed themselves.
pub trait DataHandler: Send {
    /// Symbols served by this handler, in configuration order.
    fn symbols(&self) -> &[String];

    /// Most recent revealed bar for `symbol`.
    fn get_latest_bar(&self, symbol: &str) -> Result<&Bar, DataError>;

    /// Up to `n` most recent revealed bars for `symbol`, oldest first.
    /// Returns fewer than `n` when fewer have been revealed.
    fn get_latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], DataError>;

    /// Advance every symbol by one synchronized step.
    ///
    /// Returns `false` (and clears [`DataHandler::continue_backtest`]) once
    /// the calendar is exhausted. Exhaustion is a termination signal, not an
    /// error.
    fn update_bars(&mut self) -> bool;

    /// False once the feed has no further steps.
    fn continue_backtest(&self) -> bool;

    /// Timestamp of the most recently revealed step, if any.
    fn current_datetime(&self) -> Option<NaiveDateTime>;

    fn get_latest_bar_datetime(&self, symbol: &str) -> Result<NaiveDateTime, DataError> {
        Ok(self.get_latest_bar(symbol)?.timestamp)
    }

    fn get_latest_bar_value(&self, symbol: &str, field: BarField) -> Result<f64, DataError> {
        Ok(self.get_latest_bar(symbol)?.value(field))
    }

    /// Up to `n` most recent values of one field, oldest first.
    fn get_latest_bars_values(
        &self,
        symbol: &str,
        field: BarField,
        n: usize,
    ) -> Result<Vec<f64>, DataError> {
        Ok(self
            .get_latest_bars(symbol, n)?
            .iter()
            .map(|bar| bar.value(field))
            .collect())
    }
}

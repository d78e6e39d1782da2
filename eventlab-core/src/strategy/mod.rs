//! Strategy contract: market event in, zero or more signals out.
//!
//! Strategies read prices only through the [`DataHandler`] latest-bar
//! accessors. They never see portfolio state and cannot advance the feed.

pub mod buy_and_hold;
pub mod ma_cross;

pub use buy_and_hold::BuyAndHold;
pub use ma_cross::MovingAverageCross;

use crate::data::DataHandler;
use crate::domain::{MarketEvent, SignalEvent};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("window lengths must be >= 1 (short={short}, long={long})")]
    ZeroWindow { short: usize, long: usize },

    #[error("short window ({short}) must be shorter than long window ({long})")]
    WindowOrder { short: usize, long: usize },
}

/// Signal generator driven by market events.
pub trait Strategy: Send {
    /// Human-readable name (e.g. "ma_cross").
    fn name(&self) -> &str;

    /// React to one market event.
    ///
    /// Implementations must only look at bars already revealed by `data`.
    fn calculate_signals(
        &mut self,
        event: &MarketEvent,
        data: &dyn DataHandler,
    ) -> Vec<SignalEvent>;
}

//! Run lifecycle, counters and the final report.

use crate::execution::RejectionCounts;
use serde::{Deserialize, Serialize};

/// Orchestrator lifecycle.
///
/// `Running` between bars, `DrainingQueue` while the consequences of one
/// market event are being resolved, `Terminated` once the feed is exhausted
/// (or the run was cancelled) and the queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Running,
    DrainingQueue,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Event counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Calendar steps revealed.
    pub bars: usize,
    /// Market events dispatched (one per bar).
    pub market_events: usize,
    /// Signals emitted by the strategy.
    pub signals: usize,
    /// Orders issued by the portfolio.
    pub orders: usize,
    /// Fills produced by the execution handler.
    pub fills: usize,
    /// Orders that produced no fill.
    pub rejected_orders: usize,
    /// Signals that produced no order (already positioned, flat on EXIT,
    /// or refused by the cash policy).
    pub ignored_signals: usize,
    /// Subset of `ignored_signals` refused by the cash policy.
    pub rejected_signals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: RunStats,
    /// Execution rejections by reason, when the handler reports them.
    pub execution_rejections: Option<RejectionCounts>,
}

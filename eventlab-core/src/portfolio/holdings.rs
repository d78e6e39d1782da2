//! Holdings snapshots: one row per bar step.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Positions and mark-to-market holdings at one bar step.
///
/// Positions and holdings live in the same record so the two can never
/// drift apart. `total == cash + Σ market_values` holds for every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    /// Bar sequence number; 0 is the initial row at the configured start.
    pub step: usize,
    pub timestamp: NaiveDateTime,
    pub positions: BTreeMap<String, i64>,
    pub market_values: BTreeMap<String, f64>,
    pub cash: f64,
    /// Cumulative commission paid.
    pub commission: f64,
    pub total: f64,
}

impl HoldingsSnapshot {
    pub fn market_value(&self, symbol: &str) -> f64 {
        self.market_values.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// Absolute difference between `total` and `cash + Σ market_values`.
    pub fn identity_error(&self) -> f64 {
        (self.total - self.cash - self.market_values.values().sum::<f64>()).abs()
    }
}

//! Equity curve derived from the holdings history.

use super::holdings::HoldingsSnapshot;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    #[serde(flatten)]
    pub holdings: HoldingsSnapshot,
    /// `total[t] / total[t-1] − 1`; `None` for the first point or a
    /// non-positive previous total.
    pub period_return: Option<f64>,
    /// Cumulative growth factor `Π(1 + return)`, 1.0 at the first point.
    pub growth: f64,
}

impl EquityPoint {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.holdings.timestamp
    }

    pub fn total(&self) -> f64 {
        self.holdings.total
    }
}

/// Read-only, timestamp-ordered equity series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub symbols: Vec<String>,
    pub points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn from_history(symbols: &[String], history: &[HoldingsSnapshot]) -> Self {
        let mut points = Vec::with_capacity(history.len());
        let mut growth = 1.0;
        let mut prev_total: Option<f64> = None;

        for snapshot in history {
            let period_return = prev_total
                .filter(|prev| *prev > 0.0)
                .map(|prev| snapshot.total / prev - 1.0);
            if let Some(r) = period_return {
                growth *= 1.0 + r;
            }
            prev_total = Some(snapshot.total);
            points.push(EquityPoint {
                holdings: snapshot.clone(),
                period_return,
                growth,
            });
        }

        Self {
            symbols: symbols.to_vec(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Capital-relative series.
    pub fn totals(&self) -> Vec<f64> {
        self.points.iter().map(EquityPoint::total).collect()
    }

    /// Normalized series (1.0 at the first point).
    pub fn growth(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.growth).collect()
    }

    /// Defined period returns, in order.
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.period_return).collect()
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }
}

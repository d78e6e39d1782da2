//! High-water-mark drawdown series.

use serde::{Deserialize, Serialize};

/// Per-period drawdown and duration, plus their maxima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownSeries {
    /// `(hwm − equity) / hwm`, in [0, 1]. Zero exactly at a high.
    pub drawdown: Vec<f64>,
    /// Periods since the last high; 0 at a high.
    pub duration: Vec<usize>,
    pub max_drawdown: f64,
    pub max_duration: usize,
}

/// Running high-water mark drawdowns.
///
/// The mark starts at the first equity value. A period that matches or
/// exceeds the mark is a high: its drawdown is 0 and the duration resets.
/// Equity at or below zero against a positive mark is a full (1.0)
/// drawdown; a non-positive mark yields 0.
pub fn drawdowns(equity: &[f64]) -> DrawdownSeries {
    let mut drawdown = Vec::with_capacity(equity.len());
    let mut duration = Vec::with_capacity(equity.len());
    let mut hwm = match equity.first() {
        Some(&first) => first,
        None => {
            return DrawdownSeries {
                drawdown,
                duration,
                max_drawdown: 0.0,
                max_duration: 0,
            }
        }
    };
    let mut current_duration = 0usize;

    for &eq in equity {
        hwm = hwm.max(eq);
        let dd = if hwm > 0.0 {
            ((hwm - eq) / hwm).clamp(0.0, 1.0)
        } else {
            0.0
        };
        current_duration = if dd == 0.0 { 0 } else { current_duration + 1 };
        drawdown.push(dd);
        duration.push(current_duration);
    }

    let max_drawdown = drawdown.iter().copied().fold(0.0, f64::max);
    let max_duration = duration.iter().copied().max().unwrap_or(0);
    DrawdownSeries {
        drawdown,
        duration,
        max_drawdown,
        max_duration,
    }
}

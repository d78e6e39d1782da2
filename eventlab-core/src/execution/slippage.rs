//! Slippage models: shift the reference price against the trader.

use crate::domain::Direction;

pub trait SlippageModel: Send + Sync {
    /// Price actually paid (buys) or received (sells) for `reference`.
    fn adjust(&self, reference: f64, direction: Direction) -> f64;

    fn name(&self) -> &str;
}

/// Fills at the reference price.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn adjust(&self, reference: f64, _direction: Direction) -> f64 {
        reference
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Buys fill `pct` higher, sells `pct` lower (0.0005 = 5 bps).
#[derive(Debug, Clone, Copy)]
pub struct PercentSlippage {
    pub pct: f64,
}

impl PercentSlippage {
    pub fn new(pct: f64) -> Self {
        Self { pct }
    }
}

impl SlippageModel for PercentSlippage {
    fn adjust(&self, reference: f64, direction: Direction) -> f64 {
        match direction {
            Direction::Buy => reference * (1.0 + self.pct),
            Direction::Sell => reference * (1.0 - self.pct),
        }
    }

    fn name(&self) -> &str {
        "percent"
    }
}

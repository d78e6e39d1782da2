//! Liquidity constraint: cap order size at a share of bar volume.
//!
//! Orders above the cap are rejected outright; there are no partial fills.

/// Maximum participation rate (e.g., 0.05 = 5% of bar volume).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidityConstraint {
    pub max_participation: f64,
}

impl LiquidityConstraint {
    /// `None` unless `max_participation` is in (0, 1].
    pub fn new(max_participation: f64) -> Option<Self> {
        (max_participation > 0.0 && max_participation <= 1.0).then_some(Self { max_participation })
    }

    /// Largest quantity fillable against `bar_volume`.
    pub fn max_fill_qty(&self, bar_volume: f64) -> u64 {
        (bar_volume.max(0.0) * self.max_participation).floor() as u64
    }

    pub fn can_fill_completely(&self, requested_qty: u64, bar_volume: f64) -> bool {
        requested_qty <= self.max_fill_qty(bar_volume)
    }
}

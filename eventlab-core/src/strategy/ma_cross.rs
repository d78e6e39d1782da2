//! Moving-average cross on closing prices.
//!
//! LONG when the short SMA is above the long SMA and the symbol is not
//! already held by this strategy; EXIT when the short SMA drops below the
//! long SMA while held. Nothing is emitted until `long_window` bars have
//! been revealed for a symbol.

use super::{Strategy, StrategyError};
use crate::data::DataHandler;
use crate::domain::{BarField, MarketEvent, SignalEvent, SignalType};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct MovingAverageCross {
    pub short_window: usize,
    pub long_window: usize,
    bought: HashSet<String>,
}

impl MovingAverageCross {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, StrategyError> {
        if short_window == 0 || long_window == 0 {
            return Err(StrategyError::ZeroWindow {
                short: short_window,
                long: long_window,
            });
        }
        if short_window >= long_window {
            return Err(StrategyError::WindowOrder {
                short: short_window,
                long: long_window,
            });
        }
        Ok(Self {
            short_window,
            long_window,
            bought: HashSet::new(),
        })
    }

    /// True while this strategy considers `symbol` held.
    pub fn is_bought(&self, symbol: &str) -> bool {
        self.bought.contains(symbol)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn calculate_signals(&mut self, _event: &MarketEvent, data: &dyn DataHandler) -> Vec<SignalEvent> {
        let mut signals = Vec::new();
        for symbol in data.symbols() {
            let Ok(closes) = data.get_latest_bars_values(symbol, BarField::Close, self.long_window)
            else {
                continue;
            };
            if closes.len() < self.long_window {
                continue;
            }
            let Ok(ts) = data.get_latest_bar_datetime(symbol) else {
                continue;
            };

            let long_ma = mean(&closes);
            let short_ma = mean(&closes[closes.len() - self.short_window..]);
            let held = self.bought.contains(symbol);

            if short_ma > long_ma && !held {
                self.bought.insert(symbol.clone());
                signals.push(SignalEvent::new(symbol.as_str(), ts, SignalType::Long, 1.0));
            } else if short_ma < long_ma && held {
                self.bought.remove(symbol);
                signals.push(SignalEvent::new(symbol.as_str(), ts, SignalType::Exit, 1.0));
            }
        }
        signals
    }
}

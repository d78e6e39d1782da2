//! Buy-and-hold: one LONG per symbol on its first revealed bar.

use super::Strategy;
use crate::data::DataHandler;
use crate::domain::{MarketEvent, SignalEvent, SignalType};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct BuyAndHold {
    entered: HashSet<String>,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn calculate_signals(&mut self, _event: &MarketEvent, data: &dyn DataHandler) -> Vec<SignalEvent> {
        let mut signals = Vec::new();
        for symbol in data.symbols() {
            if self.entered.contains(symbol) {
                continue;
            }
            // Symbols with a leading gap are entered once their data starts.
            let Ok(ts) = data.get_latest_bar_datetime(symbol) else {
                continue;
            };
            self.entered.insert(symbol.clone());
            signals.push(SignalEvent::new(symbol.as_str(), ts, SignalType::Long, 1.0));
        }
        signals
    }
}

//! Fixed-lot, long-only portfolio.
//!
//! LONG opens one lot when flat; EXIT closes the whole position when long.
//! At most one order per symbol is issued per bar.

use super::equity::EquityCurve;
use super::holdings::HoldingsSnapshot;
use super::{CashPolicy, Portfolio, PortfolioConfig};
use crate::data::DataHandler;
use crate::domain::{BarField, Direction, FillEvent, MarketEvent, OrderEvent, SignalEvent, SignalType};
use crate::execution::CommissionModel;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct NaivePortfolio {
    symbols: Vec<String>,
    initial_capital: f64,
    config: PortfolioConfig,
    /// Used to estimate the cost of an entry under a strict cash policy.
    commission_estimate: CommissionModel,
    positions: BTreeMap<String, i64>,
    /// Latest close seen per symbol. Absent until the symbol's first bar.
    marks: BTreeMap<String, f64>,
    cash: f64,
    commission: f64,
    /// Symbols with an order already issued on the current bar.
    pending: BTreeSet<String>,
    history: Vec<HoldingsSnapshot>,
    cash_rejections: usize,
}

impl NaivePortfolio {
    /// A flat portfolio whose history starts with one row at `start`.
    pub fn new(
        symbols: &[String],
        initial_capital: f64,
        start: NaiveDateTime,
        config: PortfolioConfig,
    ) -> Self {
        let mut portfolio = Self {
            symbols: symbols.to_vec(),
            initial_capital,
            config,
            commission_estimate: CommissionModel::default(),
            positions: symbols.iter().map(|s| (s.clone(), 0)).collect(),
            marks: BTreeMap::new(),
            cash: initial_capital,
            commission: 0.0,
            pending: BTreeSet::new(),
            history: Vec::new(),
            cash_rejections: 0,
        };
        let initial = portfolio.snapshot(start);
        portfolio.history.push(initial);
        portfolio
    }

    pub fn with_commission_estimate(mut self, model: CommissionModel) -> Self {
        self.commission_estimate = model;
        self
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    fn snapshot(&self, timestamp: NaiveDateTime) -> HoldingsSnapshot {
        let market_values: BTreeMap<String, f64> = self
            .positions
            .iter()
            .map(|(symbol, &qty)| {
                let mark = self.marks.get(symbol).copied().unwrap_or(0.0);
                (symbol.clone(), qty as f64 * mark)
            })
            .collect();
        let total = self.cash + market_values.values().sum::<f64>();
        HoldingsSnapshot {
            step: self.history.len(),
            timestamp,
            positions: self.positions.clone(),
            market_values,
            cash: self.cash,
            commission: self.commission,
            total,
        }
    }

    fn entry_order(&mut self, signal: &SignalEvent) -> Option<OrderEvent> {
        let quantity = self.config.order_size;
        if self.config.cash_policy == CashPolicy::RejectInsufficient {
            let Some(&price) = self.marks.get(&signal.symbol) else {
                self.reject(signal, "no price to estimate cost");
                return None;
            };
            let estimate = quantity as f64 * price + self.commission_estimate.compute(quantity);
            if estimate > self.cash {
                self.reject(signal, "insufficient cash");
                return None;
            }
        }
        Some(OrderEvent::market(signal.symbol.as_str(), quantity, Direction::Buy))
    }

    fn reject(&mut self, signal: &SignalEvent, reason: &str) {
        self.cash_rejections += 1;
        tracing::warn!(
            symbol = %signal.symbol,
            signal = %signal.signal_type,
            cash = self.cash,
            reason,
            "signal rejected"
        );
    }
}

impl Portfolio for NaivePortfolio {
    fn update_timeindex(&mut self, _event: &MarketEvent, data: &dyn DataHandler) {
        let Some(timestamp) = data.current_datetime() else {
            tracing::warn!("market event before any bar was revealed");
            return;
        };
        for symbol in &self.symbols {
            if let Ok(close) = data.get_latest_bar_value(symbol, BarField::Close) {
                self.marks.insert(symbol.clone(), close);
            }
        }
        self.pending.clear();
        let snapshot = self.snapshot(timestamp);
        self.history.push(snapshot);
    }

    fn update_signal(&mut self, signal: &SignalEvent) -> Option<OrderEvent> {
        let Some(&current) = self.positions.get(&signal.symbol) else {
            tracing::warn!(symbol = %signal.symbol, "signal for symbol outside the portfolio");
            return None;
        };
        if self.pending.contains(&signal.symbol) {
            return None;
        }

        let order = match signal.signal_type {
            SignalType::Long if current == 0 => self.entry_order(signal),
            SignalType::Exit if current > 0 => Some(OrderEvent::market(
                signal.symbol.as_str(),
                current.unsigned_abs(),
                Direction::Sell,
            )),
            _ => None,
        };
        if order.is_some() {
            self.pending.insert(signal.symbol.clone());
        }
        order
    }

    fn update_fill(&mut self, fill: &FillEvent) {
        *self.positions.entry(fill.symbol.clone()).or_insert(0) += fill.signed_quantity();
        self.cash -= fill.signed_cost() + fill.commission;
        self.commission += fill.commission;
        self.marks.entry(fill.symbol.clone()).or_insert_with(|| fill.price());
    }

    fn current_holdings(&self) -> HoldingsSnapshot {
        let timestamp = self
            .history
            .last()
            .map(|s| s.timestamp)
            .unwrap_or_default();
        self.snapshot(timestamp)
    }

    fn history(&self) -> &[HoldingsSnapshot] {
        &self.history
    }

    fn create_equity_curve(&self) -> EquityCurve {
        EquityCurve::from_history(&self.symbols, &self.history)
    }

    fn rejected_signals(&self) -> usize {
        self.cash_rejections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HistoricalCsvDataHandler;
    use crate::domain::Bar;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn feed(closes: &[f64]) -> HistoricalCsvDataHandler {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start() + Duration::days(i as i64 + 1),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1_000_000.0,
            })
            .collect();
        HistoricalCsvDataHandler::from_bars(vec![("AAA".into(), bars)]).unwrap()
    }

    fn portfolio(config: PortfolioConfig) -> NaivePortfolio {
        NaivePortfolio::new(&["AAA".to_string()], 100_000.0, start(), config)
    }

    fn long(ts: NaiveDateTime) -> SignalEvent {
        SignalEvent::new("AAA", ts, SignalType::Long, 1.0)
    }

    fn fill(direction: Direction, qty: u64, price: f64) -> FillEvent {
        FillEvent {
            timestamp: start(),
            symbol: "AAA".into(),
            venue: "SIMULATED".into(),
            quantity: qty,
            direction,
            fill_cost: price * qty as f64,
            commission: CommissionModel::default().compute(qty),
        }
    }

    #[test]
    fn starts_with_initial_row() {
        let p = portfolio(PortfolioConfig::default());
        assert_eq!(p.history().len(), 1);
        assert_eq!(p.history()[0].timestamp, start());
        assert_eq!(p.history()[0].total, 100_000.0);
        assert_eq!(p.history()[0].step, 0);
    }

    #[test]
    fn long_only_when_flat_exit_only_when_long() {
        let mut data = feed(&[100.0, 101.0]);
        let mut p = portfolio(PortfolioConfig::default());
        data.update_bars();
        p.update_timeindex(&MarketEvent, &data);

        let exit = SignalEvent::new("AAA", start(), SignalType::Exit, 1.0);
        assert!(p.update_signal(&exit).is_none());

        let order = p.update_signal(&long(start())).unwrap();
        assert_eq!(order.direction, Direction::Buy);
        assert_eq!(order.quantity, 100);
        // Same bar: a second LONG is swallowed while the first is in flight.
        assert!(p.update_signal(&long(start())).is_none());
        p.update_fill(&fill(Direction::Buy, 100, 100.0));

        data.update_bars();
        p.update_timeindex(&MarketEvent, &data);
        assert!(p.update_signal(&long(start())).is_none());
        let sell = p.update_signal(&exit).unwrap();
        assert_eq!(sell.direction, Direction::Sell);
        assert_eq!(sell.quantity, 100);
    }

    #[test]
    fn fill_accounting() {
        let mut data = feed(&[100.0, 103.0]);
        let mut p = portfolio(PortfolioConfig::default());
        data.update_bars();
        p.update_timeindex(&MarketEvent, &data);
        p.update_fill(&fill(Direction::Buy, 100, 100.0));

        assert_eq!(p.position("AAA"), 100);
        assert_eq!(p.cash(), 89_999.0);
        let live = p.current_holdings();
        assert_eq!(live.commission, 1.0);
        assert_eq!(live.total, 89_999.0 + 10_000.0);

        data.update_bars();
        p.update_timeindex(&MarketEvent, &data);
        let last = p.history().last().unwrap();
        assert_eq!(last.market_value("AAA"), 10_300.0);
        assert_eq!(last.total, 100_299.0);
        assert!(last.identity_error() < 1e-9);
    }

    #[test]
    fn snapshot_is_pre_trade() {
        let mut data = feed(&[100.0]);
        let mut p = portfolio(PortfolioConfig::default());
        data.update_bars();
        p.update_timeindex(&MarketEvent, &data);
        p.update_fill(&fill(Direction::Buy, 100, 100.0));
        let snap = &p.history()[1];
        assert_eq!(snap.position("AAA"), 0);
        assert_eq!(snap.cash, 100_000.0);
    }

    #[test]
    fn strict_cash_policy_rejects_unaffordable_entry() {
        let mut data = feed(&[2_000.0]);
        let config = PortfolioConfig {
            order_size: 50,
            cash_policy: CashPolicy::RejectInsufficient,
        };
        let mut p = portfolio(config);
        data.update_bars();
        p.update_timeindex(&MarketEvent, &data);

        // 50 × 2000 + 1.0 commission > 100_000
        assert!(p.update_signal(&long(start())).is_none());
        assert_eq!(p.rejected_signals(), 1);

        let mut lenient = portfolio(PortfolioConfig {
            order_size: 50,
            ..PortfolioConfig::default()
        });
        lenient.update_timeindex(&MarketEvent, &data);
        assert!(lenient.update_signal(&long(start())).is_some());
        assert_eq!(lenient.rejected_signals(), 0);
    }

    #[test]
    fn unknown_symbol_signal_is_ignored() {
        let mut p = portfolio(PortfolioConfig::default());
        let sig = SignalEvent::new("ZZZ", start(), SignalType::Long, 1.0);
        assert!(p.update_signal(&sig).is_none());
    }
}

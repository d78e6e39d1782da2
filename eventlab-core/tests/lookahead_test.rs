//! Look-ahead contamination tests.
//!
//! 1. Nothing a strategy can read is newer than the current bar
//! 2. Truncating the future changes nothing about the past: a run over
//!    the first k bars produces the same signals and holdings rows as the
//!    first k bars of a full run
//! 3. On random calendars with gaps and late starts, every revealed bar is
//!    at or before the current step and each symbol has exactly one bar per
//!    step since its first observation

use chrono::{Duration, NaiveDate, NaiveDateTime};
use eventlab_core::data::{DataHandler, HistoricalCsvDataHandler};
use eventlab_core::domain::{Bar, MarketEvent, SignalEvent};
use eventlab_core::engine::Backtest;
use eventlab_core::execution::SimulatedExecutionHandler;
use eventlab_core::portfolio::{HoldingsSnapshot, NaivePortfolio, PortfolioConfig};
use eventlab_core::strategy::{MovingAverageCross, Strategy};
use proptest::prelude::{prop, prop_assert, prop_assert_eq, proptest, ProptestConfig};
use proptest::strategy::Strategy as _;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(i as i64)
}

/// Deterministic oscillating closes with drift, so MA crosses both ways.
fn wavy_bars(n: usize, phase: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let c = 100.0 + (i as f64 * 0.3 + phase).sin() * 8.0 + i as f64 * 0.05;
            Bar {
                timestamp: ts(i),
                open: c,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
                volume: 500_000.0,
            }
        })
        .collect()
}

/// Wraps a strategy, checks visibility on every call, and records signals.
struct Auditing<S> {
    inner: S,
    signals: Arc<Mutex<Vec<SignalEvent>>>,
}

impl<S: Strategy> Strategy for Auditing<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn calculate_signals(&mut self, event: &MarketEvent, data: &dyn DataHandler) -> Vec<SignalEvent> {
        let now = data.current_datetime().expect("market event with no bar");
        for symbol in data.symbols() {
            let Ok(history) = data.get_latest_bars(symbol, usize::MAX) else {
                continue;
            };
            assert!(history.iter().all(|b| b.timestamp <= now));
            assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            if let Ok(latest) = data.get_latest_bar(symbol) {
                assert!(latest.timestamp <= now);
            }
        }
        let signals = self.inner.calculate_signals(event, data);
        for s in &signals {
            assert!(s.timestamp <= now);
        }
        self.signals.lock().unwrap().extend(signals.iter().cloned());
        signals
    }
}

fn run(series: Vec<(String, Vec<Bar>)>) -> (Vec<SignalEvent>, Vec<HoldingsSnapshot>) {
    let data = HistoricalCsvDataHandler::from_bars(series).unwrap();
    let portfolio = NaivePortfolio::new(
        data.symbols(),
        50_000.0,
        data.calendar()[0],
        PortfolioConfig::default(),
    );
    let signals = Arc::new(Mutex::new(Vec::new()));
    let strategy = Auditing {
        inner: MovingAverageCross::new(3, 8).unwrap(),
        signals: signals.clone(),
    };
    let mut bt = Backtest::new(
        Box::new(data),
        Box::new(strategy),
        Box::new(portfolio),
        Box::new(SimulatedExecutionHandler::default()),
    );
    bt.run();
    let history = bt.portfolio().history().to_vec();
    let signals = signals.lock().unwrap().clone();
    (signals, history)
}

fn truncated(series: &[(String, Vec<Bar>)], k: usize) -> Vec<(String, Vec<Bar>)> {
    let cutoff = ts(k);
    series
        .iter()
        .map(|(sym, bars)| {
            (
                sym.clone(),
                bars.iter().filter(|b| b.timestamp < cutoff).cloned().collect(),
            )
        })
        .collect()
}

#[test]
fn reads_never_exceed_the_current_bar() {
    let series = vec![
        ("AAA".to_string(), wavy_bars(120, 0.0)),
        ("BBB".to_string(), wavy_bars(120, 1.7)),
    ];
    let (signals, history) = run(series);
    assert!(!signals.is_empty());
    assert_eq!(history.len(), 121);
}

#[test]
fn truncating_the_future_does_not_change_the_past() {
    let series = vec![
        ("AAA".to_string(), wavy_bars(150, 0.0)),
        ("BBB".to_string(), wavy_bars(150, 2.3)),
    ];
    let (full_signals, full_history) = run(series.clone());

    for k in [20, 57, 100] {
        let (signals, history) = run(truncated(&series, k));
        let cutoff = ts(k);

        let full_prefix: Vec<_> = full_signals
            .iter()
            .filter(|s| s.timestamp < cutoff)
            .cloned()
            .collect();
        assert_eq!(signals, full_prefix, "signals diverged at k={k}");

        // Initial row plus one row per bar.
        assert_eq!(history.len(), k + 1);
        assert_eq!(history[..], full_history[..=k], "holdings diverged at k={k}");
    }
}

#[test]
fn late_starting_symbol_is_invisible_before_its_first_bar() {
    let mut late = wavy_bars(40, 0.5);
    late.drain(..10);
    let mut data = HistoricalCsvDataHandler::from_bars(vec![
        ("AAA".to_string(), wavy_bars(40, 0.0)),
        ("LATE".to_string(), late),
    ])
    .unwrap();
    for i in 0..10 {
        assert!(data.update_bars());
        assert!(data.get_latest_bar("LATE").is_err(), "visible at step {i}");
        assert!(data.get_latest_bars("LATE", 5).map_or(true, |b| b.is_empty()));
    }
    assert!(data.update_bars());
    assert_eq!(data.get_latest_bar("LATE").unwrap().timestamp, ts(10));
}

// ── Random calendars ─────────────────────────────────────────────────

/// Per-symbol day offsets: random gaps, and symbols may start late.
fn arb_calendars() -> impl proptest::strategy::Strategy<Value = Vec<BTreeSet<usize>>> {
    prop::collection::vec(prop::collection::btree_set(0usize..60, 1..40), 1..5)
}

/// Close encodes the day so a forward-filled bar can be traced back.
fn bars_on(days: &BTreeSet<usize>) -> Vec<Bar> {
    days.iter()
        .map(|&d| {
            let c = 10.0 + d as f64;
            Bar {
                timestamp: ts(d),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 100.0,
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn revealed_bars_never_lead_the_clock(calendars in arb_calendars()) {
        let series: Vec<(String, Vec<Bar>)> = calendars
            .iter()
            .enumerate()
            .map(|(i, days)| (format!("S{i}"), bars_on(days)))
            .collect();
        let union: Vec<usize> = calendars
            .iter()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut data = HistoricalCsvDataHandler::from_bars(series).unwrap();

        for (step, &day) in union.iter().enumerate() {
            prop_assert!(data.update_bars());
            let now = data.current_datetime().unwrap();
            prop_assert_eq!(now, ts(day));

            for (i, days) in calendars.iter().enumerate() {
                let symbol = format!("S{i}");
                let revealed = data.get_latest_bars(&symbol, usize::MAX).unwrap();
                prop_assert!(revealed.iter().all(|b| b.timestamp <= now));

                let first = *days.iter().next().unwrap();
                let expected = union[..=step].iter().filter(|&&d| d >= first).count();
                prop_assert_eq!(revealed.len(), expected);

                if let Some(last) = revealed.last() {
                    let observed = *days.range(..=day).next_back().unwrap();
                    prop_assert_eq!(last.timestamp, now);
                    prop_assert_eq!(last.close, 10.0 + observed as f64);
                }
            }
        }
        prop_assert!(!data.update_bars());
        prop_assert!(!data.continue_backtest());
    }
}

//! End-to-end scenarios through CSV files on disk.
//!
//! 1. Buy-and-hold on five closes: entry fill, commission, final total
//! 2. MA cross (2/3) on a strictly increasing series never exits
//! 3. A file missing the `volume` column fails before any event exists

use chrono::{Duration, NaiveDate, NaiveDateTime};
use eventlab_core::analytics::AnalyticsConfig;
use eventlab_core::data::DataError;
use eventlab_core::engine::{Backtest, BacktestConfig, BacktestError, RunOutcome};
use eventlab_core::strategy::{BuyAndHold, MovingAverageCross};
use std::path::Path;
use tempfile::TempDir;

fn day(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(i as i64)
}

fn write_closes(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        content.push_str(&format!(
            "{},{c},{},{},{c},1000000\n",
            day(i).format("%Y-%m-%d"),
            c + 1.0,
            c - 1.0
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

fn config(dir: &Path, symbols: &[&str]) -> BacktestConfig {
    BacktestConfig::new(
        dir,
        symbols.iter().map(|s| s.to_string()).collect(),
        100_000.0,
    )
}

#[test]
fn scenario_a_buy_and_hold() {
    let dir = TempDir::new().unwrap();
    write_closes(dir.path(), "AAPL", &[100.0, 102.0, 101.0, 105.0, 103.0]);

    let mut bt = Backtest::from_config(&config(dir.path(), &["AAPL"]), Box::new(BuyAndHold::new()))
        .unwrap();
    let out = bt.simulate_trading();

    assert_eq!(out.report.outcome, RunOutcome::Completed);
    assert_eq!(out.report.stats.bars, 5);
    assert_eq!(out.report.stats.market_events, 5);
    assert_eq!(out.report.stats.signals, 1);
    assert_eq!(out.report.stats.orders, 1);
    assert_eq!(out.report.stats.fills, 1);

    // Initial row plus one row per bar.
    assert_eq!(out.equity_curve.len(), 6);
    let last = out.equity_curve.last().unwrap();
    let cash_after_buy = 100_000.0 - 100.0 * 100.0 - 1.0;
    assert_eq!(last.holdings.cash, cash_after_buy);
    assert_eq!(last.holdings.commission, 1.0);
    assert_eq!(last.holdings.position("AAPL"), 100);
    assert_eq!(last.total(), cash_after_buy + 100.0 * 103.0);
    assert_eq!(last.timestamp(), day(4));

    // Snapshot at the entry bar is pre-trade.
    assert_eq!(out.equity_curve.points[1].holdings.position("AAPL"), 0);
    assert_eq!(out.equity_curve.points[1].total(), 100_000.0);

    // The portfolio's own summary agrees with the one the run returned.
    let from_portfolio = bt
        .portfolio()
        .output_summary_stats(&AnalyticsConfig::default());
    assert_eq!(from_portfolio, out.summary);

    let summary = out.summary;
    assert!((summary.total_return.unwrap() - 0.00299).abs() < 1e-12);
    assert_eq!(summary.final_equity, Some(100_299.0));
}

#[test]
fn scenario_b_ma_cross_never_exits_on_rising_prices() {
    let dir = TempDir::new().unwrap();
    let closes: Vec<f64> = (0..60).map(|i| 50.0 + i as f64 * 0.75).collect();
    write_closes(dir.path(), "MSFT", &closes);

    let strategy = MovingAverageCross::new(2, 3).unwrap();
    let mut bt = Backtest::from_config(&config(dir.path(), &["MSFT"]), Box::new(strategy)).unwrap();
    let out = bt.simulate_trading();

    assert_eq!(out.report.stats.signals, 1);
    assert_eq!(out.report.stats.orders, 1);
    let positions: Vec<i64> = out
        .equity_curve
        .points
        .iter()
        .map(|p| p.holdings.position("MSFT"))
        .collect();
    // Never sold: once long, the position stays at one lot.
    let first_long = positions.iter().position(|&q| q > 0).unwrap();
    assert!(positions[first_long..].iter().all(|&q| q == 100));
    assert_eq!(out.report.stats.ignored_signals, 0);
}

#[test]
fn scenario_c_missing_volume_column_fails_before_any_event() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("AAPL.csv"),
        "timestamp,open,high,low,close\n2024-01-02,1,1,1,1\n",
    )
    .unwrap();

    let err = Backtest::from_config(&config(dir.path(), &["AAPL"]), Box::new(BuyAndHold::new()))
        .err()
        .unwrap();
    match err {
        BacktestError::Configuration(DataError::MissingColumn { column, .. }) => {
            assert_eq!(column, "volume")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn negative_close_in_csv_fails_before_any_event() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("AAPL.csv"),
        "timestamp,open,high,low,close,volume\n\
         2024-01-02,100,101,99,100,1000\n\
         2024-01-03,100,101,-2001,-2000,1000\n\
         2024-01-04,100,101,99,100,1000\n",
    )
    .unwrap();

    let err = Backtest::from_config(&config(dir.path(), &["AAPL"]), Box::new(BuyAndHold::new()))
        .err()
        .unwrap();
    match err {
        BacktestError::Configuration(DataError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    write_closes(dir.path(), "AAPL", &[1.0, 2.0]);
    let err = Backtest::from_config(
        &config(dir.path(), &["AAPL", "GOOG"]),
        Box::new(BuyAndHold::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        BacktestError::Configuration(DataError::MissingFile { .. })
    ));
}

#[test]
fn invalid_capital_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_closes(dir.path(), "AAPL", &[1.0, 2.0]);
    let mut cfg = config(dir.path(), &["AAPL"]);
    cfg.initial_capital = 0.0;
    assert!(matches!(
        Backtest::from_config(&cfg, Box::new(BuyAndHold::new())),
        Err(BacktestError::InvalidConfig(_))
    ));
}

#[test]
fn default_start_shares_the_first_bar_timestamp() {
    let dir = TempDir::new().unwrap();
    write_closes(dir.path(), "AAPL", &[100.0, 102.0, 101.0]);

    let mut cfg = config(dir.path(), &["AAPL"]);
    let out = Backtest::from_config(&cfg, Box::new(BuyAndHold::new()))
        .unwrap()
        .simulate_trading();
    let points = &out.equity_curve.points;
    assert_eq!(points[0].timestamp(), points[1].timestamp());
    assert_eq!(points[1].period_return, Some(0.0));

    cfg.start = Some(day(0) - Duration::days(1));
    let out = Backtest::from_config(&cfg, Box::new(BuyAndHold::new()))
        .unwrap()
        .simulate_trading();
    let stamps: Vec<_> = out.equity_curve.points.iter().map(|p| p.timestamp()).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn start_after_first_bar_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_closes(dir.path(), "AAPL", &[1.0, 2.0]);
    let mut cfg = config(dir.path(), &["AAPL"]);
    cfg.start = Some(day(1));
    assert!(matches!(
        Backtest::from_config(&cfg, Box::new(BuyAndHold::new())),
        Err(BacktestError::InvalidConfig(_))
    ));

    cfg.start = Some(day(0) - Duration::days(30));
    let mut bt = Backtest::from_config(&cfg, Box::new(BuyAndHold::new())).unwrap();
    let out = bt.simulate_trading();
    assert_eq!(out.equity_curve.points[0].timestamp(), day(0) - Duration::days(30));
}

#[test]
fn multi_symbol_union_calendar_with_gap() {
    let dir = TempDir::new().unwrap();
    write_closes(dir.path(), "AAA", &[10.0, 11.0, 12.0, 13.0]);
    // BBB starts one step late.
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for i in 1..4 {
        content.push_str(&format!("{},20,21,19,20,1000\n", day(i).format("%Y-%m-%d")));
    }
    std::fs::write(dir.path().join("BBB.csv"), content).unwrap();

    let mut bt = Backtest::from_config(
        &config(dir.path(), &["AAA", "BBB"]),
        Box::new(BuyAndHold::new()),
    )
    .unwrap();
    let out = bt.simulate_trading();

    assert_eq!(out.report.stats.bars, 4);
    assert_eq!(out.report.stats.fills, 2);
    let last = out.equity_curve.last().unwrap();
    assert_eq!(last.holdings.position("AAA"), 100);
    assert_eq!(last.holdings.position("BBB"), 100);
    // Before BBB's first bar it is worth nothing and holds nothing.
    assert_eq!(out.equity_curve.points[1].holdings.market_value("BBB"), 0.0);
    for p in &out.equity_curve.points {
        assert!(p.holdings.identity_error() < 1e-6);
    }
}

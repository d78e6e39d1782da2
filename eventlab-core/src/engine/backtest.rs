//! The backtest orchestrator.
//!
//! One loop iteration per bar step:
//! 1. Check for cancellation
//! 2. Reveal the next step and enqueue one market event
//! 3. Drain the queue, dispatching by event kind, before touching the next bar
//!
//! The strict per-bar drain is what makes the run causal: every signal,
//! order and fill caused by a bar is resolved while that bar is current.

use super::cancel::CancelToken;
use super::config::BacktestConfig;
use super::queue::EventQueue;
use super::state::{RunOutcome, RunReport, RunState, RunStats};
use super::BacktestError;
use crate::analytics::{AnalyticsConfig, PerformanceSummary};
use crate::data::{DataHandler, HistoricalCsvDataHandler};
use crate::domain::{Event, MarketEvent};
use crate::execution::{ExecutionHandler, SimulatedExecutionHandler};
use crate::portfolio::{EquityCurve, NaivePortfolio, Portfolio};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// Everything a finished run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub report: RunReport,
    pub equity_curve: EquityCurve,
    pub summary: PerformanceSummary,
}

pub struct Backtest {
    data: Box<dyn DataHandler>,
    strategy: Box<dyn Strategy>,
    portfolio: Box<dyn Portfolio>,
    execution: Box<dyn ExecutionHandler>,
    queue: EventQueue,
    state: RunState,
    outcome: RunOutcome,
    stats: RunStats,
    cancel: CancelToken,
    analytics: AnalyticsConfig,
}

impl Backtest {
    /// Wire a run from its four collaborators.
    pub fn new(
        data: Box<dyn DataHandler>,
        strategy: Box<dyn Strategy>,
        portfolio: Box<dyn Portfolio>,
        execution: Box<dyn ExecutionHandler>,
    ) -> Self {
        Self {
            data,
            strategy,
            portfolio,
            execution,
            queue: EventQueue::new(),
            state: RunState::Running,
            outcome: RunOutcome::Completed,
            stats: RunStats::default(),
            cancel: CancelToken::new(),
            analytics: AnalyticsConfig::default(),
        }
    }

    /// Load CSV data and assemble a run. Every configuration problem
    /// surfaces here, before any event exists.
    pub fn from_config(
        config: &BacktestConfig,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, BacktestError> {
        validate(config)?;
        let data =
            HistoricalCsvDataHandler::with_window(&config.csv_dir, &config.symbols, config.window)?;
        Self::with_data(data, config, strategy)
    }

    /// Assemble a run over an already-loaded handler (e.g. a replay fork).
    pub fn with_data(
        data: HistoricalCsvDataHandler,
        config: &BacktestConfig,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, BacktestError> {
        validate(config)?;
        let first_bar = data
            .calendar()
            .first()
            .copied()
            .ok_or_else(|| BacktestError::InvalidConfig("no bars to replay".into()))?;
        let start = match config.start {
            Some(start) if start > first_bar => {
                return Err(BacktestError::InvalidConfig(format!(
                    "start {start} is after the first bar {first_bar}"
                )))
            }
            Some(start) => start,
            None => first_bar,
        };

        let execution = SimulatedExecutionHandler::new(&config.execution)?;
        let portfolio = NaivePortfolio::new(
            data.symbols(),
            config.initial_capital,
            start,
            config.portfolio,
        )
        .with_commission_estimate(config.execution.commission);

        Ok(Self::new(
            Box::new(data),
            strategy,
            Box::new(portfolio),
            Box::new(execution),
        )
        .with_analytics(config.analytics))
    }

    pub fn with_analytics(mut self, analytics: AnalyticsConfig) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle for cancelling this run from elsewhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            rejected_signals: self.portfolio.rejected_signals(),
            ..self.stats
        }
    }

    pub fn portfolio(&self) -> &dyn Portfolio {
        self.portfolio.as_ref()
    }

    pub fn data(&self) -> &dyn DataHandler {
        self.data.as_ref()
    }

    /// Drive the event loop until the feed is exhausted or the run is
    /// cancelled. A terminated run is not replayed; calling again just
    /// returns the report.
    pub fn run(&mut self) -> RunReport {
        if self.state == RunState::Terminated {
            return self.report();
        }
        tracing::info!(
            strategy = self.strategy.name(),
            symbols = self.data.symbols().len(),
            "backtest started"
        );

        while self.data.continue_backtest() {
            if self.cancel.is_cancelled() {
                tracing::warn!(bars = self.stats.bars, "backtest cancelled");
                self.outcome = RunOutcome::Cancelled;
                break;
            }
            if !self.data.update_bars() {
                break;
            }
            self.stats.bars += 1;
            self.queue.push(MarketEvent);
            self.state = RunState::DrainingQueue;
            self.drain();
            self.state = RunState::Running;
        }

        self.state = RunState::Terminated;
        let report = self.report();
        tracing::info!(
            outcome = ?report.outcome,
            bars = report.stats.bars,
            signals = report.stats.signals,
            orders = report.stats.orders,
            fills = report.stats.fills,
            rejected_orders = report.stats.rejected_orders,
            "backtest finished"
        );
        report
    }

    /// Run to completion, then derive the equity curve and statistics.
    pub fn simulate_trading(&mut self) -> BacktestOutput {
        let report = self.run();
        let equity_curve = self.portfolio.create_equity_curve();
        let summary = self.portfolio.output_summary_stats(&self.analytics);
        BacktestOutput {
            report,
            equity_curve,
            summary,
        }
    }

    fn report(&self) -> RunReport {
        RunReport {
            outcome: self.outcome,
            stats: self.stats(),
            execution_rejections: self.execution.rejection_counts(),
        }
    }

    fn drain(&mut self) {
        while let Some(event) = self.queue.pop() {
            tracing::trace!(kind = %event.kind(), "dispatch");
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Market(market) => {
                self.stats.market_events += 1;
                let signals = self.strategy.calculate_signals(&market, self.data.as_ref());
                self.portfolio.update_timeindex(&market, self.data.as_ref());
                self.stats.signals += signals.len();
                for signal in signals {
                    self.queue.push(signal);
                }
            }
            Event::Signal(signal) => match self.portfolio.update_signal(&signal) {
                Some(order) => {
                    tracing::debug!(
                        symbol = %order.symbol,
                        direction = %order.direction,
                        quantity = order.quantity,
                        "order placed"
                    );
                    self.stats.orders += 1;
                    self.queue.push(order);
                }
                None => {
                    tracing::debug!(
                        symbol = %signal.symbol,
                        signal = %signal.signal_type,
                        "signal refused by portfolio"
                    );
                    self.stats.ignored_signals += 1;
                }
            },
            Event::Order(order) => match self.execution.execute_order(&order, self.data.as_ref()) {
                Some(fill) => {
                    self.stats.fills += 1;
                    self.queue.push(fill);
                }
                None => self.stats.rejected_orders += 1,
            },
            Event::Fill(fill) => self.portfolio.update_fill(&fill),
        }
    }
}

fn validate(config: &BacktestConfig) -> Result<(), BacktestError> {
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(BacktestError::InvalidConfig(format!(
            "initial_capital must be positive, got {}",
            config.initial_capital
        )));
    }
    if config.portfolio.order_size == 0 {
        return Err(BacktestError::InvalidConfig("order_size must be at least 1".into()));
    }
    if !config.window.is_valid() {
        return Err(BacktestError::InvalidConfig("window start is after window end".into()));
    }
    if !(config.analytics.periods_per_year.is_finite() && config.analytics.periods_per_year > 0.0) {
        return Err(BacktestError::InvalidConfig(format!(
            "periods_per_year must be positive, got {}",
            config.analytics.periods_per_year
        )));
    }
    Ok(())
}

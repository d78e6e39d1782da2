//! Parallel parameter sweep over moving-average windows.
//!
//! The CSV files are loaded once. Every grid point then runs on its own
//! replay fork of that handler with its own strategy, portfolio, execution
//! handler and queue, so runs share nothing mutable.

use rayon::prelude::*;
use std::collections::HashMap;

use eventlab_core::engine::CancelToken;

use crate::config::{RunConfig, StrategyConfig};
use crate::runner::{load_data, run_with_data, BacktestResult, RunError};

/// Short × long window grid. Pairs with `short >= long` are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGrid {
    /// Short moving-average windows to test
    pub short_windows: Vec<usize>,

    /// Long moving-average windows to test
    pub long_windows: Vec<usize>,
}

impl ParamGrid {
    pub fn new(short_windows: Vec<usize>, long_windows: Vec<usize>) -> Self {
        Self {
            short_windows,
            long_windows,
        }
    }

    /// Short: 10, 20, 50. Long: 100, 150, 200.
    pub fn ma_cross_default() -> Self {
        Self::new(vec![10, 20, 50], vec![100, 150, 200])
    }

    /// Valid (short, long) pairs in grid order: short-major, then long.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.short_windows
            .iter()
            .flat_map(|&short| {
                self.long_windows
                    .iter()
                    .filter(move |&&long| short > 0 && short < long)
                    .map(move |&long| (short, long))
            })
            .collect()
    }

    pub fn size(&self) -> usize {
        self.pairs().len()
    }

    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        self.pairs()
            .into_iter()
            .map(|(short_window, long_window)| {
                base.with_strategy(StrategyConfig::MaCross {
                    short_window,
                    long_window,
                })
            })
            .collect()
    }
}

/// Runs a grid against one base config.
pub struct ParamSweep {
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// One token shared by every run of the sweep.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Execute the sweep. Results come back in grid order regardless of
    /// which worker finished first.
    pub fn sweep(&self, grid: &ParamGrid, base: &RunConfig) -> Result<SweepResults, RunError> {
        let data = load_data(base)?;
        let configs = grid.generate_configs(base);
        tracing::info!(
            runs = configs.len(),
            parallel = self.parallel,
            bars = data.len(),
            "sweep started"
        );

        let run = |config: &RunConfig| run_with_data(config, data.fresh_replay(), self.cancel.clone());
        let results = if self.parallel {
            configs.par_iter().map(run).collect::<Result<Vec<_>, _>>()?
        } else {
            configs.iter().map(run).collect::<Result<Vec<_>, _>>()?
        };

        tracing::info!(runs = results.len(), "sweep finished");
        Ok(SweepResults::new(results))
    }
}

/// Sweep output in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { results, by_run_id }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results with a defined Sharpe ratio, best first. Ties keep grid order.
    pub fn sorted_by_sharpe(&self) -> Vec<&BacktestResult> {
        let mut ranked: Vec<_> = self
            .results
            .iter()
            .filter(|r| r.summary.sharpe.is_some())
            .collect();
        ranked.sort_by(|a, b| {
            b.summary
                .sharpe
                .partial_cmp(&a.summary.sharpe)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by_sharpe().into_iter().next()
    }
}

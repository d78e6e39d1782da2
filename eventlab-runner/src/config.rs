//! TOML run configuration.
//!
//! ```toml
//! [data]
//! csv_dir = "data"
//! symbols = ["AAPL", "MSFT"]
//! start = "2020-01-01"        # optional load window
//!
//! [backtest]
//! initial_capital = 100000.0
//!
//! [execution]
//! slippage_pct = 0.0005
//!
//! [strategy]
//! type = "ma_cross"
//! short_window = 50
//! long_window = 200
//! ```
//!
//! Sections other than `[data]` are optional and fall back to the core
//! defaults.

use chrono::NaiveDateTime;
use eventlab_core::analytics::AnalyticsConfig;
use eventlab_core::data::{parse_timestamp, LoadWindow};
use eventlab_core::engine::BacktestConfig;
use eventlab_core::execution::{ExecutionConfig, ExecutionError};
use eventlab_core::portfolio::PortfolioConfig;
use eventlab_core::strategy::{BuyAndHold, MovingAverageCross, Strategy, StrategyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content hash of a run configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field} timestamp '{value}'")]
    Timestamp { field: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything needed to reproduce one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataSection,
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Directory holding one `{SYMBOL}.csv` per symbol.
    pub csv_dir: PathBuf,
    /// Symbols to load, in the order holdings columns are reported.
    pub symbols: Vec<String>,
    /// Drop bars before this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Drop bars after this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    /// Starting cash.
    pub initial_capital: f64,
    /// Timestamp of the initial holdings row. Defaults to the first bar,
    /// in which case that row shares its timestamp with the first bar's
    /// snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            start: None,
        }
    }
}

/// Which strategy drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    BuyAndHold,
    MaCross {
        short_window: usize,
        long_window: usize,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MaCross {
            short_window: 50,
            long_window: 200,
        }
    }
}

impl StrategyConfig {
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(match *self {
            StrategyConfig::BuyAndHold => Box::new(BuyAndHold::new()),
            StrategyConfig::MaCross {
                short_window,
                long_window,
            } => Box::new(MovingAverageCross::new(short_window, long_window)?),
        })
    }

    /// Short label used in logs and artifact names.
    pub fn label(&self) -> String {
        match self {
            StrategyConfig::BuyAndHold => "buy_and_hold".to_string(),
            StrategyConfig::MaCross {
                short_window,
                long_window,
            } => format!("ma_cross_{short_window}_{long_window}"),
        }
    }
}

impl RunConfig {
    /// A config over `symbols` in `csv_dir` with every other section at
    /// its default.
    pub fn new(csv_dir: impl Into<PathBuf>, symbols: Vec<String>) -> Self {
        Self {
            data: DataSection {
                csv_dir: csv_dir.into(),
                symbols,
                start: None,
                end: None,
            },
            backtest: BacktestSection::default(),
            portfolio: PortfolioConfig::default(),
            execution: ExecutionConfig::default(),
            analytics: AnalyticsConfig::default(),
            strategy: StrategyConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file. A relative `csv_dir` is resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if config.data.csv_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data.csv_dir = parent.join(&config.data.csv_dir);
            }
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reject anything that would fail once the run is wired.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.symbols.is_empty() {
            return Err(ConfigError::Invalid("data.symbols must not be empty".into()));
        }
        if let Some(sym) = self.data.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("blank symbol '{sym}'")));
        }
        let capital = self.backtest.initial_capital;
        if !(capital.is_finite() && capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_capital must be positive, got {capital}"
            )));
        }
        if self.portfolio.order_size == 0 {
            return Err(ConfigError::Invalid("portfolio.order_size must be at least 1".into()));
        }
        let ppy = self.analytics.periods_per_year;
        if !(ppy.is_finite() && ppy > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "analytics.periods_per_year must be positive, got {ppy}"
            )));
        }
        self.execution.validate()?;
        if !self.window()?.is_valid() {
            return Err(ConfigError::Invalid("data.start is after data.end".into()));
        }
        self.start()?;
        self.strategy.build()?;
        Ok(())
    }

    pub fn window(&self) -> Result<LoadWindow, ConfigError> {
        Ok(LoadWindow {
            start: timestamp("data.start", self.data.start.as_deref())?,
            end: timestamp("data.end", self.data.end.as_deref())?,
        })
    }

    pub fn start(&self) -> Result<Option<NaiveDateTime>, ConfigError> {
        timestamp("backtest.start", self.backtest.start.as_deref())
    }

    /// The core-level view of this config.
    pub fn to_backtest_config(&self) -> Result<BacktestConfig, ConfigError> {
        let mut config = BacktestConfig::new(
            &self.data.csv_dir,
            self.data.symbols.clone(),
            self.backtest.initial_capital,
        );
        config.start = self.start()?;
        config.window = self.window()?;
        config.portfolio = self.portfolio;
        config.execution = self.execution.clone();
        config.analytics = self.analytics;
        Ok(config)
    }

    /// Same config with a different strategy.
    pub fn with_strategy(&self, strategy: StrategyConfig) -> Self {
        Self {
            strategy,
            ..self.clone()
        }
    }

    /// Deterministic BLAKE3 hash of the serialized config.
    ///
    /// Identical configs share a run id; any parameter change produces a
    /// new one.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

fn timestamp(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDateTime>, ConfigError> {
    raw.map(|value| {
        parse_timestamp(value).ok_or_else(|| ConfigError::Timestamp {
            field,
            value: value.to_string(),
        })
    })
    .transpose()
}

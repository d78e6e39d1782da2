//! Historical CSV data handler.
//!
//! Loads `{csv_dir}/{SYMBOL}.csv` for every configured symbol up front,
//! aligns them onto the union calendar, then reveals one step per
//! [`DataHandler::update_bars`] call. All file I/O happens in the
//! constructor; stepping never touches the filesystem.

use super::align::{align_symbols, AlignedData};
use super::cache::SeriesCache;
use super::{DataError, DataHandler};
use crate::domain::Bar;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Optional inclusive bounds applied to every series before alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl LoadWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(s), Some(e)) => s <= e,
            _ => true,
        }
    }
}

#[derive(Debug)]
pub struct HistoricalCsvDataHandler {
    csv_dir: PathBuf,
    symbols: Vec<String>,
    window: LoadWindow,
    cache: SeriesCache,
    aligned: Arc<AlignedData>,
    dataset_hash: String,
    /// Already-revealed bars per symbol. Only ever appended to.
    latest: HashMap<String, Vec<Bar>>,
    cursor: usize,
    continue_backtest: bool,
}

impl HistoricalCsvDataHandler {
    /// Load every symbol from `csv_dir` with no window.
    pub fn new(csv_dir: impl Into<PathBuf>, symbols: &[String]) -> Result<Self, DataError> {
        Self::with_window(csv_dir, symbols, LoadWindow::default())
    }

    pub fn with_window(
        csv_dir: impl Into<PathBuf>,
        symbols: &[String],
        window: LoadWindow,
    ) -> Result<Self, DataError> {
        let csv_dir = csv_dir.into();
        let symbols = dedup_symbols(symbols)?;
        let mut cache = SeriesCache::new();

        let mut series = Vec::with_capacity(symbols.len());
        let mut hasher = blake3::Hasher::new();
        for symbol in &symbols {
            let path = csv_dir.join(format!("{symbol}.csv"));
            let entry = cache.get_or_load(symbol, &path)?;
            hasher.update(symbol.as_bytes());
            hasher.update(entry.content_hash.as_bytes());
            series.push((symbol.clone(), window_bars(symbol, &entry.bars, window)?));
        }

        let handler = Self::assemble(
            csv_dir,
            symbols,
            window,
            cache,
            &series,
            hasher.finalize().to_hex().to_string(),
        );
        tracing::info!(
            dir = %handler.csv_dir.display(),
            symbols = handler.symbols.len(),
            steps = handler.aligned.len(),
            dataset_hash = %handler.dataset_hash,
            "historical data loaded"
        );
        Ok(handler)
    }

    /// Build a handler from in-memory series, one `(symbol, bars)` pair per
    /// symbol. Bars are sorted; duplicate timestamps are rejected.
    pub fn from_bars(series: Vec<(String, Vec<Bar>)>) -> Result<Self, DataError> {
        let symbols: Vec<String> = series.iter().map(|(s, _)| s.clone()).collect();
        let symbols = dedup_symbols(&symbols)?;
        if symbols.len() != series.len() {
            return Err(DataError::Parse {
                path: PathBuf::from("<memory>"),
                line: 0,
                reason: "symbol supplied twice".to_string(),
            });
        }

        let mut hasher = blake3::Hasher::new();
        let mut sorted = Vec::with_capacity(series.len());
        for (symbol, mut bars) in series {
            if bars.is_empty() {
                return Err(DataError::EmptySeries { symbol });
            }
            bars.sort_by_key(|b| b.timestamp);
            if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
                return Err(DataError::DuplicateTimestamp {
                    path: PathBuf::from(format!("<memory:{symbol}>")),
                    timestamp: pair[0].timestamp,
                });
            }
            hasher.update(symbol.as_bytes());
            for bar in &bars {
                hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
                for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                    hasher.update(&v.to_le_bytes());
                }
            }
            sorted.push((symbol, bars));
        }

        Ok(Self::assemble(
            PathBuf::new(),
            symbols,
            LoadWindow::default(),
            SeriesCache::new(),
            &sorted,
            hasher.finalize().to_hex().to_string(),
        ))
    }

    fn assemble(
        csv_dir: PathBuf,
        symbols: Vec<String>,
        window: LoadWindow,
        cache: SeriesCache,
        series: &[(String, Vec<Bar>)],
        dataset_hash: String,
    ) -> Self {
        let views: Vec<(String, &[Bar])> = series
            .iter()
            .map(|(s, bars)| (s.clone(), bars.as_slice()))
            .collect();
        let aligned = Arc::new(align_symbols(&views));
        let latest = empty_buffers(&symbols);
        Self {
            csv_dir,
            symbols,
            window,
            cache,
            aligned,
            dataset_hash,
            latest,
            cursor: 0,
            continue_backtest: true,
        }
    }

    /// A new handler over the same loaded data with its cursor at step 0.
    ///
    /// The aligned series are shared, never copied; the revealed-bar buffers
    /// and cursor are the fork's own.
    pub fn fresh_replay(&self) -> Self {
        Self {
            csv_dir: self.csv_dir.clone(),
            symbols: self.symbols.clone(),
            window: self.window,
            cache: self.cache.clone(),
            aligned: Arc::clone(&self.aligned),
            dataset_hash: self.dataset_hash.clone(),
            latest: empty_buffers(&self.symbols),
            cursor: 0,
            continue_backtest: true,
        }
    }

    /// Reset this handler to step 0 without reloading.
    pub fn rewind(&mut self) {
        self.latest = empty_buffers(&self.symbols);
        self.cursor = 0;
        self.continue_backtest = true;
    }

    /// BLAKE3 fingerprint of the loaded data set.
    pub fn dataset_hash(&self) -> &str {
        &self.dataset_hash
    }

    pub fn csv_dir(&self) -> &Path {
        &self.csv_dir
    }

    pub fn window(&self) -> LoadWindow {
        self.window
    }

    /// The union calendar.
    pub fn calendar(&self) -> &[NaiveDateTime] {
        &self.aligned.timestamps
    }

    /// Number of steps in the union calendar.
    pub fn len(&self) -> usize {
        self.aligned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned.is_empty()
    }

    /// Number of steps revealed so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    fn revealed(&self, symbol: &str) -> Result<&[Bar], DataError> {
        self.latest
            .get(symbol)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::UnknownSymbol(symbol.to_string()))
    }
}

impl DataHandler for HistoricalCsvDataHandler {
    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn get_latest_bar(&self, symbol: &str) -> Result<&Bar, DataError> {
        self.revealed(symbol)?
            .last()
            .ok_or_else(|| DataError::NoBarsYet(symbol.to_string()))
    }

    fn get_latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], DataError> {
        let bars = self.revealed(symbol)?;
        Ok(&bars[bars.len().saturating_sub(n)..])
    }

    fn update_bars(&mut self) -> bool {
        if self.cursor >= self.aligned.len() {
            self.continue_backtest = false;
            return false;
        }
        for symbol in &self.symbols {
            if let Some(bar) = self.aligned.bar_at(symbol, self.cursor) {
                if let Some(buffer) = self.latest.get_mut(symbol) {
                    buffer.push(bar.clone());
                }
            }
        }
        self.cursor += 1;
        true
    }

    fn continue_backtest(&self) -> bool {
        self.continue_backtest
    }

    fn current_datetime(&self) -> Option<NaiveDateTime> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.aligned.timestamps.get(i).copied())
    }
}

fn dedup_symbols(symbols: &[String]) -> Result<Vec<String>, DataError> {
    if symbols.is_empty() {
        return Err(DataError::NoSymbols);
    }
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if out.contains(symbol) {
            tracing::warn!(symbol = %symbol, "duplicate symbol ignored");
        } else {
            out.push(symbol.clone());
        }
    }
    Ok(out)
}

fn window_bars(symbol: &str, bars: &[Bar], window: LoadWindow) -> Result<Vec<Bar>, DataError> {
    let kept: Vec<Bar> = bars
        .iter()
        .filter(|b| window.contains(b.timestamp))
        .cloned()
        .collect();
    if kept.is_empty() {
        return Err(DataError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }
    Ok(kept)
}

fn empty_buffers(symbols: &[String]) -> HashMap<String, Vec<Bar>> {
    symbols.iter().map(|s| (s.clone(), Vec::new())).collect()
}

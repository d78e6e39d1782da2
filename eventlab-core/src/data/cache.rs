//! Per-handler series cache.
//!
//! Each data handler owns one `SeriesCache`. Loaded series are shared as
//! `Arc<[Bar]>` with replay forks of the same handler, so a parameter sweep
//! parses each file once. Nothing outlives the handler that created it;
//! dropping the handler (or calling [`SeriesCache::clear`]) is the
//! invalidation boundary.

use super::loader::load_csv;
use super::DataError;
use crate::domain::Bar;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An immutable loaded series and the hash of its source bytes.
#[derive(Debug, Clone)]
pub struct CachedSeries {
    pub bars: Arc<[Bar]>,
    pub content_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    entries: HashMap<PathBuf, CachedSeries>,
    hits: usize,
    misses: usize,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached series for `path`, loading it on first use.
    pub fn get_or_load(&mut self, symbol: &str, path: &Path) -> Result<CachedSeries, DataError> {
        if let Some(entry) = self.entries.get(path) {
            self.hits += 1;
            return Ok(entry.clone());
        }

        let loaded = load_csv(symbol, path)?;
        tracing::debug!(
            symbol,
            path = %path.display(),
            bars = loaded.bars.len(),
            "loaded series"
        );
        let entry = CachedSeries {
            bars: loaded.bars.into(),
            content_hash: loaded.content_hash,
        };
        self.misses += 1;
        self.entries.insert(path.to_path_buf(), entry.clone());
        Ok(entry)
    }

    /// Drop one entry so the next lookup re-reads the file.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since construction.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

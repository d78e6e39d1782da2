//! CSV loading for one symbol's bar series.
//!
//! Expected header: `timestamp,open,high,low,close,volume` (case-insensitive,
//! any column order, extra columns ignored). Any missing column,
//! unparseable row or insane bar (high below low, non-positive open/close,
//! negative volume, open/close outside the range) is fatal.

use super::DataError;
use crate::domain::{Bar, BarField};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// One symbol's bars plus the BLAKE3 hash of the file they came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub bars: Vec<Bar>,
    pub content_hash: String,
}

/// Read and parse `path`. Bars come back sorted ascending by timestamp.
pub fn load_csv(symbol: &str, path: &Path) -> Result<LoadedSeries, DataError> {
    if !path.is_file() {
        return Err(DataError::MissingFile {
            symbol: symbol.to_string(),
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let bars = parse_csv(path, &bytes)?;
    if bars.is_empty() {
        return Err(DataError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    Ok(LoadedSeries {
        bars,
        content_hash: blake3::hash(&bytes).to_hex().to_string(),
    })
}

/// Parse CSV bytes. `path` is only used to label errors.
pub fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| parse_error(path, 1, e.to_string()))?
        .clone();
    let index_of = |column: &str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or_else(|| DataError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
    };

    let ts_idx = index_of("timestamp")?;
    let mut field_idx = [0usize; 5];
    for (slot, field) in field_idx.iter_mut().zip(BarField::ALL) {
        *slot = index_of(field.column())?;
    }

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            parse_error(path, line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_ts = record.get(ts_idx).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| parse_error(path, line, format!("invalid timestamp '{raw_ts}'")))?;

        let mut values = [0.0f64; 5];
        for ((value, idx), field) in values.iter_mut().zip(field_idx).zip(BarField::ALL) {
            let raw = record.get(idx).unwrap_or("");
            *value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| parse_error(path, line, format!("invalid {field} value '{raw}'")))?;
        }
        let [open, high, low, close, volume] = values;

        let bar = Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        if !bar.is_sane() {
            return Err(parse_error(
                path,
                line,
                format!("insane bar o={open} h={high} l={low} c={close} v={volume}"),
            ));
        }
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.timestamp);
    if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(DataError::DuplicateTimestamp {
            path: path.to_path_buf(),
            timestamp: pair[0].timestamp,
        });
    }

    Ok(bars)
}

/// Accepts plain dates (midnight), `YYYY-MM-DD HH:MM[:SS[.f]]`, ISO `T`
/// separators and RFC 3339 (converted to UTC).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Some(ts) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(ts);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn parse_error(path: &Path, line: u64, reason: String) -> DataError {
    DataError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

//! Multi-symbol time alignment.
//!
//! Every symbol is reindexed onto the union of all symbols' timestamps.
//! Gaps after a symbol's first observation are forward-filled from its last
//! real bar. Steps before the first observation stay empty (`None`): nothing
//! is revealed for that symbol until its data actually starts.

use crate::domain::Bar;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// Bar data for multiple symbols on a common timeline.
#[derive(Debug, Clone)]
pub struct AlignedData {
    /// The common time axis (sorted ascending, unique).
    pub timestamps: Vec<NaiveDateTime>,
    /// Bars per symbol; each inner Vec has the same length as `timestamps`.
    pub bars: HashMap<String, Vec<Option<Bar>>>,
    /// Symbols in the order they were supplied.
    pub symbols: Vec<String>,
}

impl AlignedData {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Bar for `symbol` at step `index`, if one has been observed by then.
    pub fn bar_at(&self, symbol: &str, index: usize) -> Option<&Bar> {
        self.bars.get(symbol)?.get(index)?.as_ref()
    }
}

/// Align symbols onto the union calendar.
///
/// Each input series must already be sorted ascending with unique
/// timestamps (the loader guarantees both).
pub fn align_symbols(series: &[(String, &[Bar])]) -> AlignedData {
    let timestamps: Vec<NaiveDateTime> = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.timestamp))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut aligned = HashMap::with_capacity(series.len());
    for (symbol, bars) in series {
        aligned.insert(symbol.clone(), forward_fill(bars, &timestamps));
    }

    AlignedData {
        timestamps,
        bars: aligned,
        symbols: series.iter().map(|(s, _)| s.clone()).collect(),
    }
}

fn forward_fill(bars: &[Bar], timestamps: &[NaiveDateTime]) -> Vec<Option<Bar>> {
    let mut out = Vec::with_capacity(timestamps.len());
    let mut next = 0;
    let mut last: Option<&Bar> = None;

    for &ts in timestamps {
        match bars.get(next) {
            Some(bar) if bar.timestamp == ts => {
                out.push(Some(bar.clone()));
                last = Some(bar);
                next += 1;
            }
            _ => out.push(last.map(|b| b.carried_to(ts))),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(date: &str, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn align_forward_fills_interior_gaps() {
        let spy = vec![
            bar("2024-01-02", 100.0),
            bar("2024-01-03", 101.0),
            bar("2024-01-04", 102.0),
        ];
        let qqq = vec![bar("2024-01-02", 200.0), bar("2024-01-04", 202.0)];

        let aligned = align_symbols(&[("SPY".into(), &spy), ("QQQ".into(), &qqq)]);

        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned.bars["SPY"].len(), 3);
        assert_eq!(aligned.bars["QQQ"].len(), 3);

        let filled = aligned.bar_at("QQQ", 1).unwrap();
        assert_eq!(filled.close, 200.0);
        assert_eq!(filled.timestamp, spy[1].timestamp);
        assert_eq!(aligned.bar_at("QQQ", 2).unwrap().close, 202.0);
    }

    #[test]
    fn leading_gap_stays_empty() {
        let spy = vec![bar("2024-01-02", 100.0), bar("2024-01-03", 101.0)];
        let late = vec![bar("2024-01-03", 50.0)];

        let aligned = align_symbols(&[("SPY".into(), &spy), ("LATE".into(), &late)]);

        assert!(aligned.bar_at("LATE", 0).is_none());
        assert_eq!(aligned.bar_at("LATE", 1).unwrap().close, 50.0);
        assert_eq!(aligned.symbols, vec!["SPY".to_string(), "LATE".to_string()]);
    }

    #[test]
    fn single_symbol_no_alignment_needed() {
        let spy = vec![bar("2024-01-02", 100.0)];
        let aligned = align_symbols(&[("SPY".into(), &spy)]);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.bar_at("SPY", 0).unwrap().close, 100.0);
        assert!(aligned.bar_at("SPY", 1).is_none());
        assert!(aligned.bar_at("QQQ", 0).is_none());
    }
}

//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OHLCV bar for a single symbol at one synchronized step.
///
/// Bars are immutable once revealed by a data handler. A forward-filled bar
/// carries the timestamp of the step it fills, with the OHLCV values of the
/// last real observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Value of one OHLCV field.
    pub fn value(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::Volume => self.volume,
        }
    }

    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .any(|v| !v.is_finite())
    }

    /// OHLCV sanity: finite values, positive open/close, non-negative
    /// volume, and open/close inside `[low, high]`.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }

    /// Copy of this bar re-stamped at `timestamp` (forward fill).
    pub fn carried_to(&self, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }
}

/// Fixed selector for the fields of a [`Bar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl BarField {
    pub const ALL: [BarField; 5] = [
        BarField::Open,
        BarField::High,
        BarField::Low,
        BarField::Close,
        BarField::Volume,
    ];

    /// CSV column name for this field.
    pub fn column(self) -> &'static str {
        match self {
            BarField::Open => "open",
            BarField::High => "high",
            BarField::Low => "low",
            BarField::Close => "close",
            BarField::Volume => "volume",
        }
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for BarField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BarField::ALL
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown bar field: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn value_selects_each_field() {
        let bar = sample_bar();
        assert_eq!(bar.value(BarField::Open), 100.0);
        assert_eq!(bar.value(BarField::High), 105.0);
        assert_eq!(bar.value(BarField::Low), 98.0);
        assert_eq!(bar.value(BarField::Close), 103.0);
        assert_eq!(bar.value(BarField::Volume), 50_000.0);
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        assert!(!bar.is_void());
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_sanity_checks_geometry_and_sign() {
        assert!(sample_bar().is_sane());

        let mut inverted = sample_bar();
        inverted.high = 90.0;
        assert!(!inverted.is_sane());

        let mut close_above_high = sample_bar();
        close_above_high.close = 106.0;
        assert!(!close_above_high.is_sane());

        let mut negative = sample_bar();
        negative.low = -5.0;
        negative.close = -1.0;
        assert!(!negative.is_sane());

        let mut negative_volume = sample_bar();
        negative_volume.volume = -1.0;
        assert!(!negative_volume.is_sane());

        let mut no_volume = sample_bar();
        no_volume.volume = 0.0;
        assert!(no_volume.is_sane());
    }

    #[test]
    fn carried_bar_keeps_prices() {
        let bar = sample_bar();
        let later = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let carried = bar.carried_to(later);
        assert_eq!(carried.timestamp, later);
        assert_eq!(carried.close, bar.close);
        assert_eq!(carried.volume, bar.volume);
    }

    #[test]
    fn field_parses_case_insensitively() {
        assert_eq!("Close".parse::<BarField>().unwrap(), BarField::Close);
        assert_eq!(" volume ".parse::<BarField>().unwrap(), BarField::Volume);
        assert!("adj_close".parse::<BarField>().is_err());
    }
}

//! FeatureRow — one fully warmed-up row of the feature matrix.

use super::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of lagged WMA columns attached to every row.
pub const LAG_DEPTH: usize = 5;

/// Default WMA window length.
pub const DEFAULT_PERIOD: usize = 3;

/// A bar stripped of `adj_close`, plus the current WMA and its lags.
///
/// Only complete rows are ever constructed, so every numeric field is a plain
/// `f64`. `wma_lags[0]` is the value one row earlier, `wma_lags[LAG_DEPTH - 1]`
/// the value `LAG_DEPTH` rows earlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub wma: f64,
    pub wma_lags: [f64; LAG_DEPTH],
}

impl FeatureRow {
    /// Build a row from its source bar and the already-resolved feature values.
    pub fn from_bar(bar: &Bar, wma: f64, wma_lags: [f64; LAG_DEPTH]) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            wma,
            wma_lags,
        }
    }

    /// Output column header for a given WMA period.
    ///
    /// `Date, Open, High, Low, Close, Volume, WMA(p)t, WMA(p)t-1 .. WMA(p)t-5`
    pub fn column_names(period: usize) -> Vec<String> {
        let mut names: Vec<String> = ["Date", "Open", "High", "Low", "Close", "Volume"]
            .into_iter()
            .map(String::from)
            .collect();
        names.push(format!("WMA({period})t"));
        for lag in 1..=LAG_DEPTH {
            names.push(format!("WMA({period})t-{lag}"));
        }
        names
    }

    /// Numeric fields in column order (everything after `Date`).
    pub fn values(&self) -> [f64; 6 + LAG_DEPTH] {
        let mut out = [0.0; 6 + LAG_DEPTH];
        out[0] = self.open;
        out[1] = self.high;
        out[2] = self.low;
        out[3] = self.close;
        out[4] = self.volume;
        out[5] = self.wma;
        out[6..].copy_from_slice(&self.wma_lags);
        out
    }
}

/// Minimum series length that yields at least one feature row.
///
/// Saturates at `usize::MAX` for periods no series could satisfy.
pub fn min_history(period: usize) -> usize {
    period.saturating_sub(1).saturating_add(LAG_DEPTH + 1)
}

/// Number of feature rows produced from `n` bars: `max(0, n - (period - 1) - LAG_DEPTH)`.
pub fn expected_rows(n: usize, period: usize) -> usize {
    n.saturating_sub(period.saturating_sub(1).saturating_add(LAG_DEPTH))
}

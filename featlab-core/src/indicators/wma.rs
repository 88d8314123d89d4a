//! Weighted Moving Average (WMA).
//!
//! Linearly weighted mean of close prices over a lookback window. Weights run
//! `1..=period` in chronological order, so the most recent close carries the
//! largest weight:
//!
//! `WMA[i] = Σ (k+1)·close[i-period+1+k] / (period·(period+1)/2), k = 0..period-1`
//!
//! Lookback: period - 1 (first defined value at index period-1).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Wma {
    period: usize,
    name: String,
}

impl Wma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "WMA period must be >= 1");
        Self {
            period,
            name: format!("wma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Wma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        weighted_moving_average(&closes, self.period)
    }
}

/// Compute the WMA of `closes` over a window of `period` values.
///
/// Each window is summed directly. A window containing a NaN close is `None`.
pub fn weighted_moving_average(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "WMA period must be >= 1");
    let n = closes.len();
    let mut result = vec![None; n];

    if n < period {
        return result;
    }

    let divisor = (period * (period + 1)) as f64 / 2.0;

    for (i, slot) in result.iter_mut().enumerate().skip(period - 1) {
        let window = &closes[(i + 1 - period)..=i];
        if window.iter().any(|c| c.is_nan()) {
            continue;
        }
        let weighted_sum: f64 = window
            .iter()
            .enumerate()
            .map(|(k, close)| (k + 1) as f64 * close)
            .sum();
        *slot = Some(weighted_sum / divisor);
    }

    result
}

//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, optional-valued series out.
//! Warm-up positions are `None`; there are no NaN sentinels in indicator output.

use crate::domain::Bar;

/// Trait for bar-driven indicators.
///
/// Indicators take a full bar series and produce an output series of the
/// same length. The first `lookback()` values are `None` (warm-up).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "wma_3").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

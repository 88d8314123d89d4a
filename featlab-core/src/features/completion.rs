//! Row completion filter.
//!
//! Keeps only the rows where the current WMA and every lag are defined.
//! Rows are dropped, never imputed.

use crate::domain::{Bar, FeatureRow, LAG_DEPTH};

/// Zip bars with their aligned WMA and lag series, keeping complete rows only.
///
/// Chronological order is preserved. All series must be index-aligned with
/// `bars`; a length mismatch is a programming error and panics.
pub fn complete_rows(
    bars: &[Bar],
    current: &[Option<f64>],
    lags: &[Vec<Option<f64>>; LAG_DEPTH],
) -> Vec<FeatureRow> {
    assert_eq!(
        bars.len(),
        current.len(),
        "WMA series must be aligned with bars"
    );
    for (j, lag) in lags.iter().enumerate() {
        assert_eq!(
            bars.len(),
            lag.len(),
            "lag {} series must be aligned with bars",
            j + 1
        );
    }

    bars.iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let wma = current[i]?;
            let wma_lags = resolve_lags(lags, i)?;
            Some(FeatureRow::from_bar(bar, wma, wma_lags))
        })
        .collect()
}

/// All lag values at index `i`, or `None` if any of them is missing.
fn resolve_lags(lags: &[Vec<Option<f64>>; LAG_DEPTH], i: usize) -> Option<[f64; LAG_DEPTH]> {
    let mut resolved = [0.0; LAG_DEPTH];
    for (slot, lag) in resolved.iter_mut().zip(lags) {
        *slot = lag[i]?;
    }
    Some(resolved)
}

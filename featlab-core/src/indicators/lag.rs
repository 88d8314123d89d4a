//! Lag expansion.
//!
//! Derives lagged copies of an indicator series. Every lag is a pure shift of
//! the one current series; lags are never recomputed from bars.

/// Shift `values` forward by `lag` positions, filling the head with `None`.
///
/// Output position `i` holds `values[i - lag]`, or `None` when `i < lag`.
pub fn shift(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i >= lag { values[i - lag] } else { None })
        .collect()
}

/// Build lags `1..=L` of `current`. Element `j` of the result is lag `j + 1`.
pub fn lag_features<const L: usize>(current: &[Option<f64>]) -> [Vec<Option<f64>>; L] {
    std::array::from_fn(|j| shift(current, j + 1))
}

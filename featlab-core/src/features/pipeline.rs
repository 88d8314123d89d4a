//! Feature pipeline — WMA, then lag expansion, then row completion.
//!
//! The three stages run strictly in sequence for one symbol. The pipeline
//! holds nothing but its configuration, so one instance can be shared across
//! threads and run on any number of symbols.

use super::completion::complete_rows;
use crate::domain::{Bar, FeatureRow, DEFAULT_PERIOD, LAG_DEPTH};
use crate::indicators::{lag_features, Indicator, Wma};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("WMA period must be at least 1 (got {0})")]
    InvalidPeriod(usize),
}

/// Derives the feature matrix for one symbol's bars.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    wma: Wma,
}

impl FeaturePipeline {
    pub fn new(period: usize) -> Result<Self, FeatureError> {
        if period == 0 {
            return Err(FeatureError::InvalidPeriod(period));
        }
        Ok(Self {
            wma: Wma::new(period),
        })
    }

    pub fn period(&self) -> usize {
        self.wma.period()
    }

    /// Run all three stages over an ordered bar series.
    ///
    /// Series shorter than `min_history(period)` produce an empty set; that
    /// is "no usable features", not an error.
    pub fn run(&self, bars: &[Bar]) -> FeatureSet {
        let current = self.wma.compute(bars);
        let lags = lag_features::<LAG_DEPTH>(&current);
        let rows = complete_rows(bars, &current, &lags);
        FeatureSet {
            period: self.period(),
            rows,
        }
    }
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self {
            wma: Wma::new(DEFAULT_PERIOD),
        }
    }
}

/// The immutable output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub period: usize,
    pub rows: Vec<FeatureRow>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Output column header for this set's period.
    pub fn column_names(&self) -> Vec<String> {
        FeatureRow::column_names(self.period)
    }

    /// Deterministic BLAKE3 hash over the period, dates and every numeric field.
    ///
    /// Two runs over the same bars with the same period always agree.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.period as u64).to_le_bytes());
        for row in &self.rows {
            hasher.update(row.date.to_string().as_bytes());
            for value in row.values() {
                hasher.update(&value.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

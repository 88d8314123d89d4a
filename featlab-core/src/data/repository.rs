//! Time series repository trait and structured error types.
//!
//! The repository abstracts over where raw series come from and where feature
//! sets go, so the batch orchestrator can run against the filesystem or an
//! in-memory fake in tests.

use crate::domain::Bar;
use crate::features::FeatureSet;
use std::path::PathBuf;
use thiserror::Error;

/// Per-symbol data errors. All of them are recoverable at batch level:
/// the symbol is skipped and the batch continues.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("no raw series for '{symbol}' at {}", path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("malformed series: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet I/O error: {0}")]
    Parquet(String),
}

impl SeriesError {
    /// Short machine-friendly category for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SeriesError::NotFound { .. } => "source_not_found",
            SeriesError::Malformed(_) => "malformed_series",
            SeriesError::Io(_) | SeriesError::Csv(_) | SeriesError::Parquet(_) => "io",
        }
    }
}

/// Source of raw bar series and sink for feature sets, keyed by symbol.
///
/// Storing a feature set replaces whatever was stored for that symbol before.
pub trait TimeSeriesRepository: Send + Sync {
    /// Human-readable name of this repository.
    fn name(&self) -> &str;

    /// Load the ordered bar series for a symbol.
    fn load_bars(&self, symbol: &str) -> Result<Vec<Bar>, SeriesError>;

    /// Persist a symbol's feature set. Returns a description of where it went.
    fn store_features(&self, symbol: &str, features: &FeatureSet) -> Result<String, SeriesError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let not_found = SeriesError::NotFound {
            symbol: "B".into(),
            path: PathBuf::from("data/raw/B.csv"),
        };
        assert_eq!(not_found.kind(), "source_not_found");
        assert_eq!(
            not_found.to_string(),
            "no raw series for 'B' at data/raw/B.csv"
        );
        assert_eq!(
            SeriesError::Malformed("empty series".into()).kind(),
            "malformed_series"
        );
    }
}

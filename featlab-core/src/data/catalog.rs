//! Symbol catalog — the flat ticker list that drives a batch.
//!
//! The catalog is a CSV file with a header row. One column (by default
//! `ticker`) names the symbols; any other columns are ignored. Without that
//! column no symbol list can be derived, so its absence is fatal for the batch.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name of the identifying column.
pub const DEFAULT_TICKER_COLUMN: &str = "ticker";

/// Fatal catalog errors. Any of these aborts the batch before a symbol is processed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("symbol catalog {path} does not exist")]
    NotFound { path: PathBuf },

    #[error("symbol catalog must contain a '{column}' column")]
    MissingColumn { column: String },

    #[error("read symbol catalog: {0}")]
    Csv(#[from] csv::Error),
}

/// Ordered, de-duplicated list of symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolCatalog {
    symbols: Vec<String>,
}

impl SymbolCatalog {
    /// Build a catalog from an explicit symbol list (duplicates and blanks dropped).
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let symbols = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        Self { symbols }
    }

    /// Load a catalog from a CSV file.
    pub fn from_path(path: &Path, column: &str) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file, column)
    }

    /// Parse a catalog from any CSV source.
    pub fn from_reader<R: Read>(reader: R, column: &str) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let index = rdr
            .headers()?
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| CatalogError::MissingColumn {
                column: column.to_string(),
            })?;

        let mut tickers = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if let Some(ticker) = record.get(index) {
                tickers.push(ticker.to_string());
            }
        }

        Ok(Self::from_symbols(tickers))
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

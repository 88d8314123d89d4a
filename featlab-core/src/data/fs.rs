//! Filesystem repository.
//!
//! Layout:
//! - raw series: `{raw_dir}/{SYMBOL}.csv`
//! - features:   `{output_dir}/{SYMBOL}_preprocessed.{csv|parquet}`
//!
//! Writes are atomic (write to .tmp, rename into place) and overwrite any
//! previous output for the symbol. The row index is never persisted.

use super::repository::{SeriesError, TimeSeriesRepository};
use super::series::read_bars;
use crate::domain::{Bar, LAG_DEPTH};
use crate::features::FeatureSet;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk format for feature sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Repository over a raw-series directory and a feature output directory.
#[derive(Debug, Clone)]
pub struct FsRepository {
    raw_dir: PathBuf,
    output_dir: PathBuf,
    format: OutputFormat,
}

impl FsRepository {
    pub fn new(raw_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            output_dir: output_dir.into(),
            format: OutputFormat::Csv,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path to the raw series for a symbol: `{raw_dir}/{SYMBOL}.csv`
    ///
    /// Does not validate the symbol; `load_bars` and `store_features` do.
    pub fn raw_path(&self, symbol: &str) -> PathBuf {
        self.raw_dir.join(format!("{symbol}.csv"))
    }

    /// Path to the feature output for a symbol.
    pub fn output_path(&self, symbol: &str) -> PathBuf {
        self.output_dir
            .join(format!("{symbol}_preprocessed.{}", self.format.extension()))
    }
}

/// A symbol becomes a file name stem, so it must not name another directory.
fn check_symbol(symbol: &str) -> Result<(), SeriesError> {
    let escapes = symbol.is_empty()
        || symbol == "."
        || symbol.contains("..")
        || symbol.contains(['/', '\\'])
        || Path::new(symbol).is_absolute();
    if escapes {
        return Err(SeriesError::Malformed(format!(
            "symbol '{symbol}' is not a plain file name"
        )));
    }
    Ok(())
}

impl TimeSeriesRepository for FsRepository {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn load_bars(&self, symbol: &str) -> Result<Vec<Bar>, SeriesError> {
        check_symbol(symbol)?;
        let path = self.raw_path(symbol);
        if !path.is_file() {
            return Err(SeriesError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }
        tracing::debug!(symbol, path = %path.display(), "reading raw series");
        let file = fs::File::open(&path)?;
        read_bars(file)
    }

    fn store_features(&self, symbol: &str, features: &FeatureSet) -> Result<String, SeriesError> {
        check_symbol(symbol)?;
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_path(symbol);
        let tmp_path = path.with_extension(format!("{}.tmp", self.format.extension()));

        let written = match self.format {
            OutputFormat::Csv => write_csv(features, &tmp_path),
            OutputFormat::Parquet => write_parquet(features, &tmp_path),
        }
        .and_then(|()| fs::rename(&tmp_path, &path).map_err(SeriesError::from));

        // Never leave a partial .tmp behind
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        tracing::debug!(symbol, path = %path.display(), rows = features.len(), "stored features");
        Ok(path.display().to_string())
    }
}

// ── Writers ─────────────────────────────────────────────────────────

/// Write a feature set as CSV with the canonical header.
///
/// Floats use Rust's shortest round-trip formatting, so no precision is lost.
pub fn write_features_csv<W: std::io::Write>(
    features: &FeatureSet,
    writer: W,
) -> Result<(), SeriesError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(features.column_names())?;

    for row in &features.rows {
        let mut record = Vec::with_capacity(7 + LAG_DEPTH);
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.extend(row.values().iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_csv(features: &FeatureSet, path: &Path) -> Result<(), SeriesError> {
    let file = fs::File::create(path)?;
    write_features_csv(features, file)
}

/// Convert a feature set to a Polars DataFrame with the canonical column names.
pub fn features_to_dataframe(features: &FeatureSet) -> Result<DataFrame, SeriesError> {
    let names = features.column_names();
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| SeriesError::Parquet("epoch date".into()))?;

    let dates: Vec<i32> = features
        .rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(names.len());
    columns.push(
        Column::new(names[0].as_str().into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| SeriesError::Parquet(format!("date cast: {e}")))?,
    );
    for (idx, name) in names.iter().enumerate().skip(1) {
        let values: Vec<f64> = features.rows.iter().map(|r| r.values()[idx - 1]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    DataFrame::new(columns).map_err(|e| SeriesError::Parquet(format!("dataframe creation: {e}")))
}

fn write_parquet(features: &FeatureSet, path: &Path) -> Result<(), SeriesError> {
    let mut df = features_to_dataframe(features)?;
    let file = fs::File::create(path)?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| SeriesError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

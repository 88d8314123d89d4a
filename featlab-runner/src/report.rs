//! Batch report — one outcome per catalog symbol.
//!
//! Symbol failures are data, not control flow: the orchestrator records a
//! `SymbolOutcome` for every symbol and the caller decides what to do with
//! the aggregate. The report exports as JSON or CSV.

use anyhow::{Context, Result};
use featlab_core::data::SeriesError;
use featlab_core::domain::{min_history, Symbol};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happened to one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    /// Features were computed and stored. `rows == 0` means the series was
    /// too short to yield a complete row.
    Processed {
        rows: usize,
        bars: usize,
        location: String,
        fingerprint: String,
    },
    /// The symbol was skipped; the batch carried on.
    Skipped { kind: String, reason: String },
}

impl SymbolOutcome {
    pub fn skipped(err: &SeriesError) -> Self {
        SymbolOutcome::Skipped {
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SymbolOutcome::Processed { .. })
    }

    /// Rows written, or 0 for a skipped symbol.
    pub fn rows(&self) -> usize {
        match self {
            SymbolOutcome::Processed { rows, .. } => *rows,
            SymbolOutcome::Skipped { .. } => 0,
        }
    }

    /// Processed, but no usable features.
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, SymbolOutcome::Processed { rows: 0, .. })
    }
}

/// Outcome for a single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub outcome: SymbolOutcome,
}

/// Aggregate result of a batch run, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub period: usize,
    pub generated_at: chrono::NaiveDateTime,
    pub symbols: Vec<SymbolReport>,
}

impl BatchReport {
    pub fn new(period: usize, symbols: Vec<SymbolReport>) -> Self {
        Self {
            period,
            generated_at: chrono::Utc::now().naive_utc(),
            symbols,
        }
    }

    pub fn total(&self) -> usize {
        self.symbols.len()
    }

    pub fn succeeded(&self) -> usize {
        self.symbols.iter().filter(|s| s.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn total_rows(&self) -> usize {
        self.symbols.iter().map(|s| s.outcome.rows()).sum()
    }

    pub fn all_failed(&self) -> bool {
        !self.symbols.is_empty() && self.succeeded() == 0
    }

    /// Process exit code: 1 only when every symbol failed, otherwise 0.
    pub fn exit_code(&self) -> i32 {
        if self.all_failed() {
            1
        } else {
            0
        }
    }

    /// Look up the outcome for a symbol.
    pub fn outcome(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .map(|s| &s.outcome)
    }

    /// One human-readable line per symbol.
    pub fn summary_lines(&self) -> Vec<String> {
        self.symbols
            .iter()
            .map(|s| match &s.outcome {
                SymbolOutcome::Processed {
                    rows: 0,
                    bars,
                    location,
                    ..
                } => format!(
                    "EMPTY {:<10} 0 rows ({bars} bars, need at least {}) -> {location}",
                    s.symbol,
                    min_history(self.period)
                ),
                SymbolOutcome::Processed { rows, location, .. } => {
                    format!("OK    {:<10} {rows} rows -> {location}", s.symbol)
                }
                SymbolOutcome::Skipped { reason, .. } => {
                    format!("FAIL  {:<10} {reason}", s.symbol)
                }
            })
            .collect()
    }
}

// ─── Export ─────────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BatchReport to JSON")
}

/// Export a report as CSV: symbol, status, rows, bars, detail.
pub fn export_csv(report: &BatchReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "status", "rows", "bars", "detail"])?;

    for s in &report.symbols {
        match &s.outcome {
            SymbolOutcome::Processed {
                rows,
                bars,
                location,
                ..
            } => {
                let status = if *rows == 0 { "insufficient_history" } else { "ok" };
                wtr.write_record([
                    s.symbol.as_str(),
                    status,
                    &rows.to_string(),
                    &bars.to_string(),
                    location.as_str(),
                ])?;
            }
            SymbolOutcome::Skipped { kind, reason } => {
                wtr.write_record([s.symbol.as_str(), kind.as_str(), "0", "", reason.as_str()])?;
            }
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write a report to `path`, as CSV when the extension is `.csv`, JSON otherwise.
pub fn save_report(report: &BatchReport, path: &Path) -> Result<()> {
    let body = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => export_csv(report)?,
        _ => export_json(report)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report dir: {}", parent.display()))?;
    }
    std::fs::write(path, body)
        .with_context(|| format!("failed to write report: {}", path.display()))
}

//! Batch orchestrator — runs the feature pipeline over every catalog symbol.
//!
//! Each symbol is independent: load its series, compute features, store them.
//! A failure for one symbol is recorded in the report and the batch moves on.
//! Only a missing or unreadable catalog aborts the run.

use crate::config::{ConfigError, PipelineConfig};
use crate::report::{BatchReport, SymbolOutcome, SymbolReport};
use featlab_core::data::{CatalogError, SeriesError, SymbolCatalog, TimeSeriesRepository};
use featlab_core::domain::{count_insane, min_history};
use featlab_core::features::FeaturePipeline;
use rayon::prelude::*;
use thiserror::Error;

/// Batch-fatal errors. Per-symbol problems never surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("symbol catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Progress callback for batch runs.
///
/// Callbacks may arrive from several worker threads at once when the batch
/// runs in parallel; `index` is the symbol's catalog position.
pub trait BatchProgress: Send + Sync {
    /// Called before a symbol is loaded.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called once a symbol has been processed or skipped.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &SymbolOutcome);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits tracing events.
pub struct LogProgress;

impl BatchProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::debug!("[{}/{}] processing {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: &SymbolOutcome) {
        match outcome {
            SymbolOutcome::Processed { rows: 0, bars, .. } => tracing::warn!(
                symbol,
                bars,
                "[{}/{}] {symbol}: insufficient history, no complete rows",
                index + 1,
                total
            ),
            SymbolOutcome::Processed { rows, location, .. } => tracing::info!(
                symbol,
                rows,
                "[{}/{}] {symbol}: saved to {location}",
                index + 1,
                total
            ),
            SymbolOutcome::Skipped { kind, reason } => tracing::warn!(
                symbol,
                kind = kind.as_str(),
                "[{}/{}] {symbol}: skipped: {reason}",
                index + 1,
                total
            ),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "batch complete");
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl BatchProgress for NoProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _: &str, _: usize, _: usize, _: &SymbolOutcome) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}

/// Drives the pipeline over a symbol catalog against a repository.
pub struct BatchOrchestrator<R: TimeSeriesRepository> {
    repo: R,
    pipeline: FeaturePipeline,
    parallel: bool,
    threads: usize,
}

impl<R: TimeSeriesRepository> BatchOrchestrator<R> {
    /// Sequential orchestrator.
    pub fn new(repo: R, pipeline: FeaturePipeline) -> Self {
        Self {
            repo,
            pipeline,
            parallel: false,
            threads: 0,
        }
    }

    /// Enable rayon. `threads == 0` uses the global pool, otherwise a private
    /// pool of that size is built per run.
    pub fn with_parallelism(mut self, parallel: bool, threads: usize) -> Self {
        self.parallel = parallel;
        self.threads = threads;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Process every symbol in the catalog. Outcomes come back in catalog
    /// order regardless of the execution mode.
    pub fn run(
        &self,
        catalog: &SymbolCatalog,
        progress: &dyn BatchProgress,
    ) -> Result<BatchReport, BatchError> {
        let symbols = catalog.symbols();
        let total = symbols.len();
        tracing::info!(
            repository = self.repo.name(),
            symbols = total,
            period = self.pipeline.period(),
            parallel = self.parallel,
            "starting batch"
        );

        let process = |(index, symbol): (usize, &String)| -> SymbolReport {
            progress.on_start(symbol, index, total);
            let outcome = match self.process_symbol(symbol) {
                Ok(outcome) => outcome,
                Err(err) => SymbolOutcome::skipped(&err),
            };
            progress.on_complete(symbol, index, total, &outcome);
            SymbolReport {
                symbol: symbol.clone(),
                outcome,
            }
        };

        let reports: Vec<SymbolReport> = if !self.parallel {
            symbols.iter().enumerate().map(process).collect()
        } else if self.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
            pool.install(|| symbols.par_iter().enumerate().map(process).collect())
        } else {
            symbols.par_iter().enumerate().map(process).collect()
        };

        let report = BatchReport::new(self.pipeline.period(), reports);
        progress.on_batch_complete(report.succeeded(), report.failed(), report.total());
        Ok(report)
    }

    /// Load → features → store for one symbol.
    pub fn process_symbol(&self, symbol: &str) -> Result<SymbolOutcome, SeriesError> {
        let bars = self.repo.load_bars(symbol)?;
        let insane = count_insane(&bars);
        if insane > 0 {
            tracing::warn!(
                symbol,
                insane,
                bars = bars.len(),
                "bars fail the OHLC sanity check, processing them unchanged"
            );
        }
        let features = self.pipeline.run(&bars);

        if features.is_empty() {
            tracing::debug!(
                symbol,
                bars = bars.len(),
                needed = min_history(self.pipeline.period()),
                "series shorter than warm-up"
            );
        }

        let location = self.repo.store_features(symbol, &features)?;
        Ok(SymbolOutcome::Processed {
            rows: features.len(),
            bars: bars.len(),
            location,
            fingerprint: features.fingerprint(),
        })
    }
}

/// Build everything from a configuration and run it.
pub fn run_batch(
    config: &PipelineConfig,
    progress: &dyn BatchProgress,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    let catalog = config.load_catalog()?;
    if catalog.is_empty() {
        tracing::warn!(path = %config.catalog.path.display(), "symbol catalog is empty");
    }

    let orchestrator = BatchOrchestrator::new(config.build_repository(), config.build_pipeline()?)
        .with_parallelism(config.batch.parallel, config.batch.threads);
    orchestrator.run(&catalog, progress)
}

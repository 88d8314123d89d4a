//! FeatLab Runner — batch orchestration, configuration, run reports.
//!
//! This crate builds on `featlab-core` to provide:
//! - TOML pipeline configuration with defaults for every key
//! - Batch orchestrator that processes a symbol catalog, sequentially or on rayon
//! - Per-symbol outcomes with a JSON/CSV batch report

pub mod config;
pub mod orchestrator;
pub mod report;

pub use config::{
    BatchConfig, CatalogConfig, ConfigError, DataConfig, FeatureConfig, PipelineConfig,
};
pub use orchestrator::{
    run_batch, BatchError, BatchOrchestrator, BatchProgress, LogProgress, NoProgress,
};
pub use report::{
    export_csv, export_json, save_report, BatchReport, SymbolOutcome, SymbolReport,
};

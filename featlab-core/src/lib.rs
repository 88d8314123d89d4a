//! FeatLab Core — domain types, indicators, feature pipeline, series I/O.
//!
//! This crate turns one symbol's daily bar series into a fixed-width feature
//! matrix:
//! - Domain types (bars, feature rows)
//! - Weighted moving average of close prices
//! - Lag expansion of the WMA column
//! - Row completion filter that drops warm-up rows
//! - Symbol catalog, raw CSV reader, and a filesystem repository with CSV and
//!   Parquet sinks

pub mod data;
pub mod domain;
pub mod features;
pub mod indicators;

pub use domain::{Bar, FeatureRow, DEFAULT_PERIOD, LAG_DEPTH};
pub use features::{FeaturePipeline, FeatureSet};

//! Serializable pipeline configuration.
//!
//! Every key has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [catalog]
//! path = "data/tickers.csv"
//! column = "ticker"
//!
//! [data]
//! raw_dir = "data/raw"
//! output_dir = "data/preprocessed"
//! format = "csv"
//!
//! [features]
//! period = 3
//!
//! [batch]
//! parallel = true
//! threads = 0
//! ```

use featlab_core::data::{
    CatalogError, FsRepository, OutputFormat, SymbolCatalog, DEFAULT_TICKER_COLUMN,
};
use featlab_core::domain::DEFAULT_PERIOD;
use featlab_core::features::{FeatureError, FeaturePipeline};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Full configuration for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub catalog: CatalogConfig,
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub batch: BatchConfig,
}

/// Where the symbol list comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// CSV file listing the symbols.
    pub path: PathBuf,
    /// Name of the identifying column.
    pub column: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/tickers.csv"),
            column: DEFAULT_TICKER_COLUMN.to_string(),
        }
    }
}

/// Raw input and feature output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/preprocessed"),
            format: OutputFormat::Csv,
        }
    }
}

/// Feature parameters. The lag depth is fixed and not configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// Window length for the weighted moving average.
    pub period: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
        }
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Process symbols on a rayon pool.
    pub parallel: bool,
    /// Worker threads for the private pool; 0 uses the global rayon pool.
    pub threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.period == 0 {
            return Err(FeatureError::InvalidPeriod(0).into());
        }
        if self.catalog.column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "catalog column name must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn build_pipeline(&self) -> Result<FeaturePipeline, ConfigError> {
        Ok(FeaturePipeline::new(self.features.period)?)
    }

    pub fn build_repository(&self) -> FsRepository {
        FsRepository::new(&self.data.raw_dir, &self.data.output_dir).with_format(self.data.format)
    }

    pub fn load_catalog(&self) -> Result<SymbolCatalog, CatalogError> {
        SymbolCatalog::from_path(&self.catalog.path, &self.catalog.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.features.period, 3);
        assert_eq!(config.catalog.column, "ticker");
        assert_eq!(config.data.format, OutputFormat::Csv);
        assert!(config.batch.parallel);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = PipelineConfig::from_toml(
            r#"
[features]
period = 10

[data]
format = "parquet"
"#,
        )
        .unwrap();
        assert_eq!(config.features.period, 10);
        assert_eq!(config.data.format, OutputFormat::Parquet);
        assert_eq!(config.data.raw_dir, PathBuf::from("data/raw"));
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = PipelineConfig::from_toml("[features]\nperiod = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Feature(FeatureError::InvalidPeriod(0))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineConfig::from_toml("[features]\nlags = 7\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = PipelineConfig::default();
        config.features.period = 5;
        config.batch.threads = 4;
        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/featlab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/featlab.toml"));
    }
}

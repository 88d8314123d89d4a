//! Symbol catalog, raw series ingestion and feature persistence

pub mod catalog;
pub mod fs;
pub mod repository;
pub mod series;

pub use catalog::{CatalogError, SymbolCatalog, DEFAULT_TICKER_COLUMN};
pub use fs::{features_to_dataframe, write_features_csv, FsRepository, OutputFormat};
pub use repository::{SeriesError, TimeSeriesRepository};
pub use series::read_bars;

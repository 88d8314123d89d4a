//! Domain types for FeatLab

pub mod bar;
pub mod feature_row;

pub use bar::{count_insane, Bar};
pub use feature_row::{expected_rows, min_history, FeatureRow, DEFAULT_PERIOD, LAG_DEPTH};

/// Symbol type alias
pub type Symbol = String;

//! Feature matrix construction.

pub mod completion;
pub mod pipeline;

pub use completion::complete_rows;
pub use pipeline::{FeatureError, FeaturePipeline, FeatureSet};

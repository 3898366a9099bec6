//! Series construction and numeric helpers

mod preprocessor;
pub mod stats;

pub use preprocessor::SeriesPreprocessor;

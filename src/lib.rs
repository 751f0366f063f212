//! Per-organisation marketing-mix regression datasets built from benchmark
//! e-commerce and marketing metrics, plus rolling-window folds for
//! validating models fitted on them.

pub mod aggregate;
pub mod assemble;
pub mod attributes;
pub mod channels;
pub mod config;
pub mod error;
pub mod folds;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod storage;
pub mod trim;

pub use assemble::RegressionTable;
pub use config::{PipelineOptions, SourceConfig, SourceFormat};
pub use error::PipelineError;
pub use folds::{fold_masks, in_sample_mask, FoldSpec, FoldWindow};
pub use loader::MetricSource;
pub use pipeline::{build_from_metrics, build_many, build_regression_data};
pub use schema::{Grain, MetricRecord};
pub use trim::TrimMode;

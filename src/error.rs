use thiserror::Error;

/// Failures the pipeline refuses to paper over.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("fold number {fold_number} outside 1..={total_folds}")]
    InvalidFold { fold_number: usize, total_folds: usize },

    #[error("training window of {training_periods} periods needs more than {rows} rows")]
    InsufficientHistory { training_periods: usize, rows: usize },

    #[error("organisation {organisation_id} has {tuples} distinct (gmv bucket, vertical, sub-vertical) tuples")]
    InconsistentAttributes { organisation_id: String, tuples: usize },

    #[error("date column not found or not date-like: {0}")]
    MissingDateColumn(String),

    #[error("unsupported metric source: {0}")]
    UnsupportedSource(String),
}

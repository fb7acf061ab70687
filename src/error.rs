//! Error types for tunnel-datum

use thiserror::Error;

/// Errors that can occur while building the activity table.
///
/// A `SchemaError` is fatal and aborts the whole batch. A `RowParse` error is
/// recovered by the normalizer: the offending row is skipped and accounted
/// for, never propagated out of a batch-level call. Undefined divisions in
/// the rate and projection formulas are not errors at all; those metrics
/// report `None`.
#[derive(Debug, Error)]
pub enum DatumError {
    #[error("missing required column: {0}")]
    SchemaError(String),

    #[error("row {row}: {message}")]
    RowParse { row: usize, message: String },

    #[error("invalid CSV input: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

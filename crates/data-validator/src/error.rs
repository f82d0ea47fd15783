//! Ingest Error Types

use thiserror::Error;

/// Errors rejecting a reading at ingest; rejected readings are never persisted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Metric kind not recognised
    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    /// Value could not be read as a number for this metric
    #[error("Invalid value {raw:?} for metric {metric}")]
    InvalidValue { metric: String, raw: String },

    /// NaN or infinite value
    #[error("Non-finite value for metric {0}")]
    NonFiniteValue(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

//! Reading Ingest
//!
//! Resolves metric names, validates values and turns raw device payloads
//! into immutable readings.

mod error;
mod validator;

pub use error::IngestError;
pub use validator::{parse_metric, validate, RawReading, RawValue};

//! Threshold Evaluation
//!
//! Classifies readings as normal, warning or critical against the global
//! threshold table or an individual's overrides.

mod evaluator;
mod table;

pub use evaluator::{classify, validate_bands, ThresholdError, ThresholdEvaluator};
pub use table::ThresholdTable;

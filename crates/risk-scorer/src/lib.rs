//! Risk Scoring
//!
//! Aggregates alert history, vital-sign volatility and fall events over a
//! trailing window into a 0-100 score with per-metric factors.

mod scorer;
mod statistics;

pub use scorer::{RiskConfig, RiskError, RiskScorer, MAX_WINDOW_DAYS};
pub use statistics::SeriesStatistics;

//! Threshold band definitions

use serde::{Deserialize, Serialize};

/// Inclusive value range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether `value` lies within the band (bounds included)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Classification bands for one metric kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricBands {
    /// Normal band nested inside a warning envelope; outside both is critical
    Range { normal: Band, warning: Band },
    /// Single ceiling; values strictly above it are critical
    Ceiling { critical_above: f64 },
}

impl MetricBands {
    pub const fn range(normal: Band, warning: Band) -> Self {
        MetricBands::Range { normal, warning }
    }

    pub const fn ceiling(critical_above: f64) -> Self {
        MetricBands::Ceiling { critical_above }
    }

    /// Width of the normal band, used to normalize volatility
    pub fn normal_width(&self) -> Option<f64> {
        match self {
            MetricBands::Range { normal, .. } if normal.width() > 0.0 => Some(normal.width()),
            _ => None,
        }
    }
}

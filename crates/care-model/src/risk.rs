//! Risk scores

use crate::individual::IndividualId;
use crate::metric::MetricKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contribution of one metric kind to a risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub metric: MetricKind,
    /// Decayed, severity-weighted alert points
    pub alert_points: f64,
    /// Normalized standard deviation points
    pub volatility_points: f64,
    /// Fixed penalties for fall events
    pub fall_points: f64,
    /// Alerts counted in the window
    pub alert_count: usize,
}

impl RiskFactor {
    pub fn new(metric: MetricKind) -> Self {
        Self {
            metric,
            alert_points: 0.0,
            volatility_points: 0.0,
            fall_points: 0.0,
            alert_count: 0,
        }
    }

    /// Total weight of this factor
    pub fn weight(&self) -> f64 {
        self.alert_points + self.volatility_points + self.fall_points
    }
}

/// Risk level bands over the 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskLevel::Low
        } else if score < 70.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Bounded risk score for one individual; superseded, never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub individual_id: IndividualId,
    /// Clamped to [0, 100]
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub reading_count: usize,
    pub window_start: DateTime<Utc>,
    pub computed_at: DateTime<Utc>,
}

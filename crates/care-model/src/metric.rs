//! Metric kinds and severity levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of sample a reading carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Heart rate (bpm)
    HeartRate,
    /// Systolic blood pressure (mmHg)
    SystolicPressure,
    /// Diastolic blood pressure (mmHg)
    DiastolicPressure,
    /// Blood glucose (mg/dL)
    Glucose,
    /// Oxygen saturation, SpO₂ (%)
    OxygenSaturation,
    /// Fall/motion impact magnitude (g)
    FallImpact,
    /// Time without movement after a fall (s)
    PostFallInactivity,
}

impl MetricKind {
    /// Every metric kind, in display order
    pub const ALL: [MetricKind; 7] = [
        MetricKind::HeartRate,
        MetricKind::SystolicPressure,
        MetricKind::DiastolicPressure,
        MetricKind::Glucose,
        MetricKind::OxygenSaturation,
        MetricKind::FallImpact,
        MetricKind::PostFallInactivity,
    ];

    /// Canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "heart_rate",
            MetricKind::SystolicPressure => "systolic_pressure",
            MetricKind::DiastolicPressure => "diastolic_pressure",
            MetricKind::Glucose => "glucose",
            MetricKind::OxygenSaturation => "oxygen_saturation",
            MetricKind::FallImpact => "fall_impact",
            MetricKind::PostFallInactivity => "post_fall_inactivity",
        }
    }

    /// Resolve a metric name, accepting the aliases used by device feeds
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let kind = match normalized.as_str() {
            "heart_rate" | "hr" | "pulse" => MetricKind::HeartRate,
            "systolic_pressure" | "systolic" | "blood_pressure_systolic" => {
                MetricKind::SystolicPressure
            }
            "diastolic_pressure" | "diastolic" | "blood_pressure_diastolic" => {
                MetricKind::DiastolicPressure
            }
            "glucose" | "glucose_level" | "glucose_levels" => MetricKind::Glucose,
            "oxygen_saturation" | "spo2" | "spo₂" => MetricKind::OxygenSaturation,
            "fall_impact" | "fall" | "motion" | "impact" => MetricKind::FallImpact,
            "post_fall_inactivity" | "inactivity" | "post_fall_inactivity_duration" => {
                MetricKind::PostFallInactivity
            }
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the kind is a vital sign (as opposed to a safety event)
    pub fn is_vital_sign(&self) -> bool {
        !matches!(self, MetricKind::FallImpact | MetricKind::PostFallInactivity)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal classification of a reading: normal < warning < critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Severity {
    /// Whether this severity opens or updates an alert
    pub fn is_breach(self) -> bool {
        self >= Severity::Warning
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

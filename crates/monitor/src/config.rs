//! Monitor configuration

use alerting::AlertConfig;
use risk_scorer::RiskConfig;
use serde::{Deserialize, Serialize};
use thresholds::ThresholdTable;

/// Monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Alert lifecycle settings
    pub lifecycle: AlertConfig,

    /// Risk scoring weights and window
    pub risk: RiskConfig,

    /// Global threshold table
    pub thresholds: ThresholdTable,
}

impl MonitorConfig {
    /// Create strict config (slower resolution, heavier risk weights)
    pub fn strict() -> Self {
        Self {
            lifecycle: AlertConfig::strict(),
            risk: RiskConfig::strict(),
            ..Default::default()
        }
    }

    /// Create lenient config (faster resolution, lighter risk weights)
    pub fn lenient() -> Self {
        Self {
            lifecycle: AlertConfig::lenient(),
            risk: RiskConfig::lenient(),
            ..Default::default()
        }
    }
}

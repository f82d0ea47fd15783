//! Global threshold table

use crate::evaluator::{validate_bands, ThresholdError};
use care_model::{Band, MetricBands, MetricKind};
use serde::{Deserialize, Serialize};

/// Default bands per metric kind, used when an individual has no override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTable {
    /// Heart rate (bpm): normal 60-100, warning 50-120
    pub heart_rate: MetricBands,
    /// Systolic pressure (mmHg): normal 90-120, warning 80-140
    pub systolic_pressure: MetricBands,
    /// Diastolic pressure (mmHg): normal 60-80, warning 50-90
    pub diastolic_pressure: MetricBands,
    /// Glucose (mg/dL): normal 70-140, warning 54-180
    pub glucose: MetricBands,
    /// SpO₂ (%): normal 95-100, warning 90-100, critical below 90
    pub oxygen_saturation: MetricBands,
    /// Fall impact (g): critical above 2.5
    pub fall_impact: MetricBands,
    /// Post-fall inactivity (s): critical above 300
    pub post_fall_inactivity: MetricBands,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            heart_rate: MetricBands::range(Band::new(60.0, 100.0), Band::new(50.0, 120.0)),
            systolic_pressure: MetricBands::range(Band::new(90.0, 120.0), Band::new(80.0, 140.0)),
            diastolic_pressure: MetricBands::range(Band::new(60.0, 80.0), Band::new(50.0, 90.0)),
            glucose: MetricBands::range(Band::new(70.0, 140.0), Band::new(54.0, 180.0)),
            oxygen_saturation: MetricBands::range(Band::new(95.0, 100.0), Band::new(90.0, 100.0)),
            fall_impact: MetricBands::ceiling(2.5),
            post_fall_inactivity: MetricBands::ceiling(300.0),
        }
    }
}

impl ThresholdTable {
    /// Bands for a metric kind
    pub fn get(&self, metric: MetricKind) -> &MetricBands {
        match metric {
            MetricKind::HeartRate => &self.heart_rate,
            MetricKind::SystolicPressure => &self.systolic_pressure,
            MetricKind::DiastolicPressure => &self.diastolic_pressure,
            MetricKind::Glucose => &self.glucose,
            MetricKind::OxygenSaturation => &self.oxygen_saturation,
            MetricKind::FallImpact => &self.fall_impact,
            MetricKind::PostFallInactivity => &self.post_fall_inactivity,
        }
    }

    /// Replace the bands for a metric kind
    pub fn set(&mut self, metric: MetricKind, bands: MetricBands) {
        let slot = match metric {
            MetricKind::HeartRate => &mut self.heart_rate,
            MetricKind::SystolicPressure => &mut self.systolic_pressure,
            MetricKind::DiastolicPressure => &mut self.diastolic_pressure,
            MetricKind::Glucose => &mut self.glucose,
            MetricKind::OxygenSaturation => &mut self.oxygen_saturation,
            MetricKind::FallImpact => &mut self.fall_impact,
            MetricKind::PostFallInactivity => &mut self.post_fall_inactivity,
        };
        *slot = bands;
    }

    /// Check every metric's bands
    pub fn validate(&self) -> Result<(), ThresholdError> {
        MetricKind::ALL
            .iter()
            .try_for_each(|metric| validate_bands(*metric, self.get(*metric)))
    }

    /// Builder-style variant of [`ThresholdTable::set`]
    pub fn with(mut self, metric: MetricKind, bands: MetricBands) -> Self {
        self.set(metric, bands);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_bands() {
        let table = ThresholdTable::default();
        for kind in MetricKind::ALL {
            let bands = table.get(kind);
            if kind.is_vital_sign() {
                assert!(bands.normal_width().is_some(), "{kind} lacks a normal band");
            } else {
                assert!(matches!(bands, MetricBands::Ceiling { .. }), "{kind} lacks a ceiling");
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_defaults() {
        assert!(ThresholdTable::default().validate().is_ok());

        let inverted = ThresholdTable::default().with(
            MetricKind::Glucose,
            MetricBands::range(Band::new(140.0, 70.0), Band::new(54.0, 180.0)),
        );
        assert!(matches!(
            inverted.validate(),
            Err(ThresholdError::InvalidBands { metric: MetricKind::Glucose, .. })
        ));

        let nan = ThresholdTable::default().with(MetricKind::FallImpact, MetricBands::ceiling(f64::NAN));
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_set_replaces_bands() {
        let table = ThresholdTable::default().with(MetricKind::FallImpact, MetricBands::ceiling(4.0));
        assert_eq!(*table.get(MetricKind::FallImpact), MetricBands::ceiling(4.0));
    }
}

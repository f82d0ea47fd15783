//! Severity Classification

use crate::table::ThresholdTable;
use care_model::{Individual, MetricBands, MetricKind, Reading, Severity};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("Invalid metric: {0}")]
    InvalidMetric(String),
    #[error("Invalid bands for {metric}: {reason}")]
    InvalidBands { metric: MetricKind, reason: String },
}

/// Check that bands are finite, ordered, and nest the normal band inside
/// the warning envelope
pub fn validate_bands(metric: MetricKind, bands: &MetricBands) -> Result<(), ThresholdError> {
    let invalid = |reason: &str| ThresholdError::InvalidBands {
        metric,
        reason: reason.to_string(),
    };
    match bands {
        MetricBands::Range { normal, warning } => {
            let bounds = [normal.low, normal.high, warning.low, warning.high];
            if bounds.iter().any(|b| !b.is_finite()) {
                return Err(invalid("bounds must be finite"));
            }
            if normal.low > normal.high || warning.low > warning.high {
                return Err(invalid("low bound above high bound"));
            }
            if warning.low > normal.low || warning.high < normal.high {
                return Err(invalid("warning band must contain the normal band"));
            }
            Ok(())
        }
        MetricBands::Ceiling { critical_above } if !critical_above.is_finite() => {
            Err(invalid("ceiling must be finite"))
        }
        MetricBands::Ceiling { .. } => Ok(()),
    }
}

/// Classify a value against one metric's bands
pub fn classify(bands: &MetricBands, value: f64) -> Severity {
    match bands {
        MetricBands::Range { normal, warning } => {
            if normal.contains(value) {
                Severity::Normal
            } else if warning.contains(value) {
                Severity::Warning
            } else {
                Severity::Critical
            }
        }
        MetricBands::Ceiling { critical_above } => {
            if value > *critical_above {
                Severity::Critical
            } else {
                Severity::Normal
            }
        }
    }
}

/// Pure evaluator over a global table plus per-individual overrides
#[derive(Debug, Clone, Default)]
pub struct ThresholdEvaluator {
    table: ThresholdTable,
}

impl ThresholdEvaluator {
    pub fn new(table: ThresholdTable) -> Self {
        info!("Creating threshold evaluator");
        Self { table }
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Effective bands: the individual's override if present, else the table
    pub fn bands_for<'a>(
        &'a self,
        metric: MetricKind,
        individual: Option<&'a Individual>,
    ) -> &'a MetricBands {
        individual
            .and_then(|person| person.threshold_override(metric))
            .unwrap_or_else(|| self.table.get(metric))
    }

    /// Classify a reading
    pub fn evaluate(&self, reading: &Reading, individual: Option<&Individual>) -> Severity {
        let severity = classify(self.bands_for(reading.metric, individual), reading.value);
        debug!(
            "{} {} {} -> {}",
            reading.individual_id,
            reading.metric,
            reading.value,
            severity
        );
        severity
    }

    /// Classify a value given by metric name
    pub fn evaluate_named(
        &self,
        metric: &str,
        value: f64,
        individual: Option<&Individual>,
    ) -> Result<Severity, ThresholdError> {
        let metric = MetricKind::from_name(metric)
            .ok_or_else(|| ThresholdError::InvalidMetric(metric.to_string()))?;
        Ok(classify(self.bands_for(metric, individual), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_model::Band;
    use chrono::Utc;
    use proptest::prelude::*;

    fn reading(metric: MetricKind, value: f64) -> Reading {
        Reading::new("D1000", metric, value, Utc::now())
    }

    #[test]
    fn test_heart_rate_bands() {
        let evaluator = ThresholdEvaluator::default();
        let cases = [
            (75.0, Severity::Normal),
            (60.0, Severity::Normal),
            (100.0, Severity::Normal),
            (55.0, Severity::Warning),
            (110.0, Severity::Warning),
            (120.0, Severity::Warning),
            (130.0, Severity::Critical),
            (42.0, Severity::Critical),
        ];
        for (value, expected) in cases {
            assert_eq!(
                evaluator.evaluate(&reading(MetricKind::HeartRate, value), None),
                expected,
                "heart rate {value}"
            );
        }
    }

    #[test]
    fn test_spo2_floor() {
        let evaluator = ThresholdEvaluator::default();
        let person = Individual::new("D1000", "Rosa Alvarez");
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::OxygenSaturation, 85.0), Some(&person)),
            Severity::Critical
        );
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::OxygenSaturation, 92.0), None),
            Severity::Warning
        );
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::OxygenSaturation, 98.0), None),
            Severity::Normal
        );
    }

    #[test]
    fn test_fall_impact_ceiling() {
        let evaluator = ThresholdEvaluator::default();
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::FallImpact, 2.5), None),
            Severity::Normal
        );
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::FallImpact, 3.1), None),
            Severity::Critical
        );
    }

    #[test]
    fn test_post_fall_inactivity_ceiling() {
        let evaluator = ThresholdEvaluator::default();
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::PostFallInactivity, 300.0), None),
            Severity::Normal
        );
        assert_eq!(
            evaluator.evaluate(&reading(MetricKind::PostFallInactivity, 420.0), None),
            Severity::Critical
        );
    }

    #[test]
    fn test_override_takes_precedence() {
        let evaluator = ThresholdEvaluator::default();
        let athlete = Individual::new("D1001", "Tomas Berg").with_threshold(
            MetricKind::HeartRate,
            MetricBands::range(Band::new(45.0, 100.0), Band::new(40.0, 120.0)),
        );
        let hr = reading(MetricKind::HeartRate, 48.0);
        assert_eq!(evaluator.evaluate(&hr, None), Severity::Critical);
        assert_eq!(evaluator.evaluate(&hr, Some(&athlete)), Severity::Normal);
    }

    #[test]
    fn test_evaluate_named_rejects_unknown_metric() {
        let evaluator = ThresholdEvaluator::default();
        assert_eq!(
            evaluator.evaluate_named("respiration", 14.0, None),
            Err(ThresholdError::InvalidMetric("respiration".to_string()))
        );
        assert_eq!(evaluator.evaluate_named("hr", 130.0, None), Ok(Severity::Critical));
    }

    #[test]
    fn test_validate_bands() {
        let ok = MetricBands::range(Band::new(60.0, 100.0), Band::new(50.0, 120.0));
        assert!(validate_bands(MetricKind::HeartRate, &ok).is_ok());

        let inverted = MetricBands::range(Band::new(100.0, 60.0), Band::new(50.0, 120.0));
        assert!(validate_bands(MetricKind::HeartRate, &inverted).is_err());

        let not_nested = MetricBands::range(Band::new(40.0, 100.0), Band::new(50.0, 120.0));
        assert!(matches!(
            validate_bands(MetricKind::HeartRate, &not_nested),
            Err(ThresholdError::InvalidBands { metric: MetricKind::HeartRate, .. })
        ));

        assert!(validate_bands(MetricKind::FallImpact, &MetricBands::ceiling(f64::NAN)).is_err());
        assert!(validate_bands(MetricKind::FallImpact, &MetricBands::ceiling(3.0)).is_ok());
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = ThresholdTable::default();
        for metric in MetricKind::ALL {
            assert!(validate_bands(metric, table.get(metric)).is_ok(), "{metric}");
        }
    }

    proptest! {
        #[test]
        fn values_in_normal_band_are_normal(value in 60.0f64..=100.0) {
            let evaluator = ThresholdEvaluator::default();
            prop_assert_eq!(
                evaluator.evaluate(&reading(MetricKind::HeartRate, value), None),
                Severity::Normal
            );
        }

        #[test]
        fn severity_grows_away_from_normal(offset in 0.0f64..200.0) {
            // Moving further above the normal band never lowers severity
            let evaluator = ThresholdEvaluator::default();
            let near = evaluator.evaluate(&reading(MetricKind::Glucose, 140.0 + offset), None);
            let far = evaluator.evaluate(&reading(MetricKind::Glucose, 140.0 + offset * 2.0), None);
            prop_assert!(far >= near);
        }
    }
}

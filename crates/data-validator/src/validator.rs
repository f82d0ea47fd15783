//! Raw Reading Validation

use crate::error::IngestError;
use care_model::{IndividualId, MetricKind, Reading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Value as delivered by a device feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    /// Numeric text, or `"systolic/diastolic"` for blood pressure
    Text(String),
}

/// Reading payload before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub individual_id: String,
    pub metric: String,
    pub value: RawValue,
    pub timestamp: DateTime<Utc>,
}

/// Resolve a metric name
pub fn parse_metric(name: &str) -> Result<MetricKind, IngestError> {
    MetricKind::from_name(name).ok_or_else(|| IngestError::InvalidMetric(name.to_string()))
}

fn is_blood_pressure(name: &str) -> bool {
    let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    matches!(normalized.as_str(), "blood_pressure" | "bp")
}

/// Validate a raw reading
///
/// Combined blood pressure (`"128/84"`) expands into a systolic and a
/// diastolic reading sharing the timestamp. Values outside clinical ranges
/// are accepted: classifying them is the evaluator's job.
pub fn validate(raw: &RawReading) -> Result<Vec<Reading>, IngestError> {
    let individual_id = raw.individual_id.trim();
    if individual_id.is_empty() {
        return Err(IngestError::MissingField("individual_id"));
    }
    let individual_id = IndividualId::new(individual_id);

    if is_blood_pressure(&raw.metric) {
        let (systolic, diastolic) = parse_pressure_pair(&raw.metric, &raw.value)?;
        debug!("Expanded blood pressure {}/{} for {}", systolic, diastolic, individual_id);
        return Ok(vec![
            Reading::new(
                individual_id.clone(),
                MetricKind::SystolicPressure,
                systolic,
                raw.timestamp,
            ),
            Reading::new(
                individual_id,
                MetricKind::DiastolicPressure,
                diastolic,
                raw.timestamp,
            ),
        ]);
    }

    let metric = parse_metric(&raw.metric)?;
    let value = match &raw.value {
        RawValue::Number(value) => *value,
        RawValue::Text(text) => parse_number(&raw.metric, text)?,
    };
    check_finite(metric.as_str(), value)?;

    Ok(vec![Reading::new(individual_id, metric, value, raw.timestamp)])
}

fn parse_number(metric: &str, text: &str) -> Result<f64, IngestError> {
    text.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| IngestError::InvalidValue {
            metric: metric.to_string(),
            raw: text.to_string(),
        })
}

fn parse_pressure_pair(metric: &str, value: &RawValue) -> Result<(f64, f64), IngestError> {
    let invalid = |raw: String| IngestError::InvalidValue {
        metric: metric.to_string(),
        raw,
    };

    let text = match value {
        RawValue::Text(text) => text,
        RawValue::Number(number) => return Err(invalid(number.to_string())),
    };
    let (systolic, diastolic) = text.split_once('/').ok_or_else(|| invalid(text.clone()))?;
    let systolic = parse_number(metric, systolic).map_err(|_| invalid(text.clone()))?;
    let diastolic = parse_number(metric, diastolic).map_err(|_| invalid(text.clone()))?;
    check_finite(metric, systolic)?;
    check_finite(metric, diastolic)?;
    Ok((systolic, diastolic))
}

fn check_finite(metric: &str, value: f64) -> Result<(), IngestError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(IngestError::NonFiniteValue(metric.to_string()))
    }
}

//! Reading Routes

use alerting::LifecycleOutcome;
use axum::{extract::State, http::StatusCode, Json};
use care_model::{Alert, Reading, Severity, TransitionCause};
use chrono::{DateTime, Utc};
use data_validator::{RawReading, RawValue};
use monitor::ReadingReport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::AppState;

/// Reading as posted by a device gateway; timestamp defaults to arrival time
#[derive(Debug, Deserialize)]
pub struct ReadingRequest {
    pub individual_id: String,
    pub metric: String,
    pub value: RawValue,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Result for one stored reading
#[derive(Debug, Serialize)]
pub struct ReadingResult {
    pub reading: Reading,
    pub severity: Severity,
    pub duplicate: bool,
    /// Alert state after the reading, when it changed
    pub alert: Option<Alert>,
    pub transition: Option<TransitionCause>,
    pub notified: bool,
    /// Normal readings counted towards resolving the active alert
    pub normal_streak: Option<u32>,
}

impl From<ReadingReport> for ReadingResult {
    fn from(report: ReadingReport) -> Self {
        let (alert, transition, notified, normal_streak) = match report.outcome {
            LifecycleOutcome::Unchanged => (None, None, false, None),
            LifecycleOutcome::Pending { normal_streak, .. } => {
                (None, None, false, Some(normal_streak))
            }
            LifecycleOutcome::Transitioned(update) => (
                Some(update.alert),
                Some(update.entry.transition.cause),
                update.notified,
                None,
            ),
        };
        Self {
            reading: report.reading,
            severity: report.severity,
            duplicate: report.duplicate,
            alert,
            transition,
            notified,
            normal_streak,
        }
    }
}

/// Response for reading ingest
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub data: Vec<ReadingResult>,
    pub count: usize,
}

/// Ingest a reading
pub async fn post_reading(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReadingRequest>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let raw = RawReading {
        individual_id: request.individual_id,
        metric: request.metric,
        value: request.value,
        timestamp: request.timestamp.unwrap_or_else(Utc::now),
    };

    let data: Vec<ReadingResult> = state
        .monitor
        .ingest(&raw)?
        .into_iter()
        .map(ReadingResult::from)
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            count: data.len(),
            data,
        }),
    ))
}

//! Risk Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use care_model::{IndividualId, RiskScore};
use chrono::{Duration, Utc};
use monitor::MonitorError;
use risk_scorer::{RiskError, MAX_WINDOW_DAYS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for risk endpoint
#[derive(Debug, Deserialize)]
pub struct RiskQuery {
    /// Lookback window in days (configured default when absent)
    pub window_days: Option<u32>,
}

/// Risk response; too little data is a soft failure, not an error
#[derive(Debug, Serialize)]
pub struct RiskResponse {
    pub insufficient_data: bool,
    pub score: Option<RiskScore>,
    pub available: Option<usize>,
    pub required: Option<usize>,
}

/// Response for risk history endpoint
#[derive(Debug, Serialize)]
pub struct RiskHistoryResponse {
    pub data: Vec<RiskScore>,
    pub count: usize,
}

/// Compute a fresh risk score
pub async fn get_risk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<RiskQuery>,
) -> ApiResult<Json<RiskResponse>> {
    let window = match params.window_days {
        Some(days) if days == 0 || days > MAX_WINDOW_DAYS => {
            return Err(ApiError::BadRequest(format!(
                "window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )))
        }
        Some(days) => Some(Duration::days(i64::from(days))),
        None => None,
    };

    match state
        .monitor
        .compute_risk_score(&IndividualId::new(id), window, Utc::now())
    {
        Ok(score) => Ok(Json(RiskResponse {
            insufficient_data: false,
            score: Some(score),
            available: None,
            required: None,
        })),
        Err(MonitorError::Risk(RiskError::InsufficientData {
            available,
            required,
        })) => Ok(Json(RiskResponse {
            insufficient_data: true,
            score: None,
            available: Some(available),
            required: Some(required),
        })),
        Err(err) => Err(err.into()),
    }
}

/// Get previously computed scores, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RiskHistoryResponse>> {
    let data = state.monitor.risk_history(&IndividualId::new(id))?;
    Ok(Json(RiskHistoryResponse {
        count: data.len(),
        data,
    }))
}

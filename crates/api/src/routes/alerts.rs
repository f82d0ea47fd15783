//! Alert Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use care_model::{Alert, AlertHistoryEntry, AlertId, AlertStatus, IndividualId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Only open and acknowledged alerts (default: true)
    #[serde(default = "default_active_only")]
    pub active_only: bool,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_active_only() -> bool {
    true
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    pub unacknowledged_count: usize,
}

/// Response for alert history endpoint
#[derive(Debug, Serialize)]
pub struct AlertHistoryResponse {
    pub data: Vec<AlertHistoryEntry>,
    pub count: usize,
}

/// Get alerts for an individual, newest first
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AlertQuery>,
) -> ApiResult<Json<AlertResponse>> {
    let limit = params.limit.min(500);
    let mut alerts = state
        .monitor
        .alerts(&IndividualId::new(id), params.active_only)?;
    alerts.truncate(limit);

    let unack = alerts
        .iter()
        .filter(|a| a.status == AlertStatus::Open)
        .count();

    Ok(Json(AlertResponse {
        count: alerts.len(),
        unacknowledged_count: unack,
        data: alerts,
    }))
}

/// Get the transition history of an alert
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AlertHistoryResponse>> {
    let data = state.monitor.alert_history(AlertId::from_uuid(id))?;
    Ok(Json(AlertHistoryResponse {
        count: data.len(),
        data,
    }))
}

/// Acknowledge an alert
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(
        state
            .monitor
            .acknowledge_alert(AlertId::from_uuid(id), Utc::now())?,
    ))
}

/// Resolve an alert
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Alert>> {
    Ok(Json(
        state
            .monitor
            .resolve_alert(AlertId::from_uuid(id), Utc::now())?,
    ))
}

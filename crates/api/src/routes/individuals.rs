//! Individual Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use care_model::{Individual, IndividualId, MetricBands, MetricKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Enrollment request
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub id: String,
    pub name: String,
    /// Per-metric overrides, keyed by metric name
    #[serde(default)]
    pub thresholds: BTreeMap<MetricKind, MetricBands>,
}

/// Enroll an individual
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnrollRequest>,
) -> ApiResult<(StatusCode, Json<Individual>)> {
    let id = request.id.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("id must not be empty".to_string()));
    }
    let mut individual = Individual::new(id, request.name);
    individual.thresholds = request.thresholds;

    let individual = state.monitor.enroll(individual)?;
    Ok((StatusCode::CREATED, Json(individual)))
}

/// Get an individual profile
pub async fn get_individual(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Individual>> {
    Ok(Json(state.monitor.individual(&IndividualId::new(id))?))
}

/// Merge threshold overrides into a profile
pub async fn update_thresholds(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(overrides): Json<BTreeMap<MetricKind, MetricBands>>,
) -> ApiResult<Json<Individual>> {
    Ok(Json(
        state
            .monitor
            .update_thresholds(&IndividualId::new(id), overrides)?,
    ))
}

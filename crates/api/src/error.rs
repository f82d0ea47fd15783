//! HTTP error mapping

use alerting::LifecycleError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use monitor::MonitorError;
use risk_scorer::RiskError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Handler error; renders as `{"error": ..., "code": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Monitor(err) => match err {
                MonitorError::Ingest(_) => (StatusCode::BAD_REQUEST, "INVALID_READING"),
                MonitorError::Threshold(_) => (StatusCode::BAD_REQUEST, "INVALID_THRESHOLDS"),
                MonitorError::IndividualNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                MonitorError::Lifecycle(LifecycleError::AlertNotFound(_)) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND")
                }
                MonitorError::Lifecycle(LifecycleError::InvalidTransition { .. }) => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION")
                }
                MonitorError::Risk(RiskError::InvalidWindow(_)) => {
                    (StatusCode::BAD_REQUEST, "INVALID_WINDOW")
                }
                MonitorError::Risk(RiskError::InsufficientData { .. }) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_DATA")
                }
                MonitorError::Lifecycle(_) | MonitorError::Risk(_) | MonitorError::Persistence(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Internal error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        counter!("carewatch_http_errors_total", "code" => code).increment(1);

        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

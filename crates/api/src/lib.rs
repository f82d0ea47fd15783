//! CareWatch API Server
//!
//! REST API for the caregiver dashboard and device gateways.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use monitor::Monitor;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{AppConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use rate_limit::RateLimitConfig;

use storage::Repository;

/// Application state shared across handlers
pub struct AppState {
    /// Care monitor over the in-memory repository
    pub monitor: Monitor<Repository>,
    /// Prometheus exposition handle
    pub metrics: PrometheusHandle,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(monitor: Monitor<Repository>, metrics: PrometheusHandle) -> Self {
        Self {
            monitor,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub metrics: SystemMetrics,
}

/// Repository counters
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub reading_count: usize,
    pub alert_count: usize,
    pub active_alert_count: usize,
}

/// Create the application router
///
/// Mutating routes are rate limited when `limits` is given; the service
/// must then be served with connect info so the peer IP is available.
pub fn create_router(state: Arc<AppState>, limits: Option<&RateLimitConfig>) -> Router {
    let mut mutating = Router::new()
        .route("/api/v1/individuals", post(routes::individuals::enroll))
        .route(
            "/api/v1/individuals/:id/thresholds",
            put(routes::individuals::update_thresholds),
        )
        .route("/api/v1/readings", post(routes::readings::post_reading))
        .route(
            "/api/v1/alerts/:id/acknowledge",
            post(routes::alerts::acknowledge),
        )
        .route("/api/v1/alerts/:id/resolve", post(routes::alerts::resolve));

    if let Some(config) = limits.and_then(rate_limit::create_governor_config) {
        mutating = mutating.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/metrics", get(metrics_handler))
        .route(
            "/api/v1/individuals/:id",
            get(routes::individuals::get_individual),
        )
        .route(
            "/api/v1/individuals/:id/alerts",
            get(routes::alerts::get_alerts),
        )
        .route("/api/v1/individuals/:id/risk", get(routes::risk::get_risk))
        .route(
            "/api/v1/individuals/:id/risk/history",
            get(routes::risk::get_history),
        )
        .route(
            "/api/v1/alerts/:id/history",
            get(routes::alerts::get_history),
        )
        .merge(mutating)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let repository = state.monitor.store();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics: SystemMetrics {
            reading_count: repository.reading_count(),
            alert_count: repository.alert_count(),
            active_alert_count: repository.active_alert_count(),
        },
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Initialize logging
pub fn init_logging(config: &ServerConfig) -> anyhow::Result<()> {
    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("Invalid log level: {}", config.log_level))?;

    let result = if config.log_format == "json" {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    result.context("Failed to set tracing subscriber")
}

/// Load the repository from the configured snapshot, if one exists
fn open_repository(config: &ServerConfig) -> anyhow::Result<Repository> {
    match &config.snapshot_path {
        Some(path) if std::path::Path::new(path).exists() => {
            let bytes =
                std::fs::read(path).with_context(|| format!("Failed to read snapshot {}", path))?;
            let repository = Repository::from_snapshot(&bytes)
                .with_context(|| format!("Failed to restore snapshot {}", path))?;
            info!("Restored repository from {}", path);
            Ok(repository)
        }
        _ => Ok(Repository::new()),
    }
}

fn save_snapshot(state: &AppState, path: &str) -> anyhow::Result<()> {
    let bytes = state.monitor.store().export_snapshot()?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write snapshot {}", path))?;
    info!("Saved repository snapshot to {}", path);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let repository = Arc::new(open_repository(&config.server)?);
    let monitor = Monitor::new(config.monitor_config(), repository);
    let state = Arc::new(AppState::new(monitor, metrics));

    if rate_limit::create_governor_config(&config.rate_limit).is_none() {
        warn!("Rate limiting disabled: invalid config {:?}", config.rate_limit);
    }
    let app = create_router(Arc::clone(&state), Some(&config.rate_limit));

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(path) = &config.server.snapshot_path {
        save_snapshot(&state, path)?;
    }

    Ok(())
}

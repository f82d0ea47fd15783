//! Care Monitor
//!
//! Single entry point for dashboards and the HTTP surface:
//! - Reading ingest and severity classification
//! - Alert lifecycle per (individual, metric kind) slot
//! - Caregiver acknowledgement and resolution
//! - Risk scoring over a trailing window

pub mod config;

pub use config::MonitorConfig;

pub use alerting::ReadingReport;

use alerting::{AlertManager, LifecycleError, Notifier};
use care_model::{
    Alert, AlertHistoryEntry, AlertId, CareStore, Individual, IndividualId, MetricBands,
    MetricKind, PersistenceError, Reading, RiskScore, Severity,
};
use chrono::{DateTime, Duration, Utc};
use data_validator::{IngestError, RawReading};
use metrics::counter;
use risk_scorer::{RiskError, RiskScorer};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use thresholds::{validate_bands, ThresholdError, ThresholdEvaluator};
use tracing::info;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Individual not found: {0}")]
    IndividualNotFound(IndividualId),
}

/// Care monitor over a persistence collaborator
pub struct Monitor<S> {
    store: Arc<S>,
    evaluator: ThresholdEvaluator,
    alerts: AlertManager<S>,
    scorer: RiskScorer,
}

impl<S: CareStore> Monitor<S> {
    /// Create a new monitor with configuration
    pub fn new(config: MonitorConfig, store: Arc<S>) -> Self {
        info!("Creating care monitor");
        Self {
            evaluator: ThresholdEvaluator::new(config.thresholds),
            alerts: AlertManager::new(config.lifecycle, Arc::clone(&store)),
            scorer: RiskScorer::new(config.risk),
            store,
        }
    }

    /// Replace the caregiver notification channel
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.alerts = self.alerts.with_notifier(notifier);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn evaluator(&self) -> &ThresholdEvaluator {
        &self.evaluator
    }

    /// Enroll (or re-enroll) an individual, validating any overrides
    pub fn enroll(&self, individual: Individual) -> Result<Individual, MonitorError> {
        for (metric, bands) in &individual.thresholds {
            validate_bands(*metric, bands)?;
        }
        self.store.save_individual(&individual)?;
        info!("Enrolled individual {}", individual.id);
        Ok(individual)
    }

    pub fn individual(&self, id: &IndividualId) -> Result<Individual, MonitorError> {
        self.store
            .load_individual(id)?
            .ok_or_else(|| MonitorError::IndividualNotFound(id.clone()))
    }

    /// Merge threshold overrides into an individual's profile
    ///
    /// Only affects readings classified afterwards.
    pub fn update_thresholds(
        &self,
        id: &IndividualId,
        overrides: BTreeMap<MetricKind, MetricBands>,
    ) -> Result<Individual, MonitorError> {
        for (metric, bands) in &overrides {
            validate_bands(*metric, bands)?;
        }
        let mut individual = self.individual(id)?;
        individual.thresholds.extend(overrides);
        self.store.save_individual(&individual)?;
        info!(
            "Updated thresholds for {} ({} overrides)",
            id,
            individual.thresholds.len()
        );
        Ok(individual)
    }

    /// Classify a reading against the individual's effective thresholds
    ///
    /// Individuals that are not enrolled are classified against the global
    /// table.
    pub fn evaluate(&self, reading: &Reading) -> Result<Severity, MonitorError> {
        let individual = self.store.load_individual(&reading.individual_id)?;
        Ok(self.evaluator.evaluate(reading, individual.as_ref()))
    }

    /// Validate a raw reading, store it, classify it and drive its slot
    ///
    /// Blood pressure text such as `"150/95"` yields one report per
    /// component.
    pub fn ingest(&self, raw: &RawReading) -> Result<Vec<ReadingReport>, MonitorError> {
        let readings = data_validator::validate(raw)?;
        readings
            .into_iter()
            .map(|reading| self.process_reading(reading))
            .collect()
    }

    /// Store, classify and apply an already validated reading
    pub fn process_reading(&self, reading: Reading) -> Result<ReadingReport, MonitorError> {
        let individual = self
            .store
            .load_individual(&reading.individual_id)?
            .ok_or_else(|| MonitorError::IndividualNotFound(reading.individual_id.clone()))?;

        let report = self
            .alerts
            .record_reading(reading, |r| self.evaluator.evaluate(r, Some(&individual)))?;
        if report.duplicate {
            counter!("carewatch_duplicate_readings_total").increment(1);
        } else {
            counter!("carewatch_readings_ingested_total", "metric" => report.reading.metric.as_str())
                .increment(1);
        }
        Ok(report)
    }

    /// Open and acknowledged alerts for an individual, newest first
    pub fn current_open_alerts(&self, id: &IndividualId) -> Result<Vec<Alert>, MonitorError> {
        self.alerts(id, true)
    }

    pub fn alerts(&self, id: &IndividualId, active_only: bool) -> Result<Vec<Alert>, MonitorError> {
        self.individual(id)?;
        Ok(self.store.load_alerts(id, active_only)?)
    }

    pub fn acknowledge_alert(&self, id: AlertId, at: DateTime<Utc>) -> Result<Alert, MonitorError> {
        Ok(self.alerts.acknowledge(id, at)?)
    }

    pub fn resolve_alert(&self, id: AlertId, at: DateTime<Utc>) -> Result<Alert, MonitorError> {
        Ok(self.alerts.resolve(id, at)?)
    }

    /// Audit trail of an alert, in commit order
    pub fn alert_history(&self, id: AlertId) -> Result<Vec<AlertHistoryEntry>, MonitorError> {
        if self.store.load_alert(id)?.is_none() {
            return Err(LifecycleError::AlertNotFound(id).into());
        }
        Ok(self.store.load_alert_history(id)?)
    }

    /// Score an individual over `window` (configured default when `None`)
    /// ending at `now`
    pub fn compute_risk_score(
        &self,
        id: &IndividualId,
        window: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<RiskScore, MonitorError> {
        let individual = self.individual(id)?;
        let window = window.unwrap_or_else(|| self.scorer.config().default_window());
        Ok(self.scorer.compute(
            self.store.as_ref(),
            &self.evaluator,
            &individual,
            window,
            now,
        )?)
    }

    /// Previously computed scores, oldest first
    pub fn risk_history(&self, id: &IndividualId) -> Result<Vec<RiskScore>, MonitorError> {
        self.individual(id)?;
        Ok(self.store.load_risk_history(id)?)
    }
}

//! Alert Lifecycle Manager
//!
//! One state machine per slot: none -> open -> acknowledged -> resolved.
//! Breaches on an active alert update it in place; enough consecutive
//! normal readings resolve it.

use crate::error::LifecycleError;
use crate::locks::SlotLocks;
use crate::notify::{Notification, NotificationPolicy, Notifier, TracingNotifier};
use care_model::{
    Alert, AlertHistoryEntry, AlertId, AlertStatus, AlertStore, Reading, ReadingSave,
    ReadingStore, Severity, Transition, TransitionCause,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Consecutive normal readings that resolve an alert (default: 3)
    pub resolve_after_normal: u32,
    /// Caregiver notification policy
    pub notification: NotificationPolicy,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            resolve_after_normal: 3,
            notification: NotificationPolicy::default(),
        }
    }
}

impl AlertConfig {
    /// Keep alerts open longer before auto-resolving
    pub fn strict() -> Self {
        Self {
            resolve_after_normal: 5,
            ..Default::default()
        }
    }

    /// Resolve after fewer normal readings
    pub fn lenient() -> Self {
        Self {
            resolve_after_normal: 2,
            ..Default::default()
        }
    }
}

/// A committed transition
#[derive(Debug, Clone, PartialEq)]
pub struct AlertUpdate {
    pub alert: Alert,
    pub entry: AlertHistoryEntry,
    /// Whether a caregiver was notified
    pub notified: bool,
}

/// What a reading did to its slot
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleOutcome {
    /// Normal reading on a clean slot
    Unchanged,
    /// Normal reading counted towards resolving an active alert
    Pending {
        alert_id: AlertId,
        normal_streak: u32,
        required: u32,
    },
    Transitioned(AlertUpdate),
}

/// What recording one reading did
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingReport {
    /// The stored reading (the earlier copy for duplicates)
    pub reading: Reading,
    pub severity: Severity,
    /// Redelivery of an already stored sample; the slot was left untouched
    pub duplicate: bool,
    pub outcome: LifecycleOutcome,
}

impl LifecycleOutcome {
    pub fn update(&self) -> Option<&AlertUpdate> {
        match self {
            LifecycleOutcome::Transitioned(update) => Some(update),
            _ => None,
        }
    }
}

/// Alert lifecycle manager over a persistence collaborator
pub struct AlertManager<S> {
    config: AlertConfig,
    store: Arc<S>,
    locks: SlotLocks,
    notifier: Arc<dyn Notifier>,
}

impl<S> AlertManager<S>
where
    S: AlertStore + ReadingStore,
{
    /// Create a new alert manager
    pub fn new(config: AlertConfig, store: Arc<S>) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            store,
            locks: SlotLocks::new(),
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replace the notification channel
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Persist a reading, classify it and drive its slot
    ///
    /// Saving and applying happen under the slot lock so no reading is ever
    /// stored for a slot without having been applied to it. `classify` is
    /// also used to re-check stored readings when counting a normal streak.
    pub fn record_reading<C>(
        &self,
        reading: Reading,
        classify: C,
    ) -> Result<ReadingReport, LifecycleError>
    where
        C: Fn(&Reading) -> Severity,
    {
        let slot = reading.slot();
        let lock = self.locks.lock_for(&slot)?;
        let _guard = lock
            .lock()
            .map_err(|e| LifecycleError::Lock(format!("Lock error: {}", e)))?;

        if let ReadingSave::Duplicate(existing) = self.store.save_reading(&reading)? {
            if existing.value != reading.value {
                warn!(
                    "Conflicting redelivery for {} at {}: kept {}, dropped {}",
                    slot, existing.timestamp, existing.value, reading.value
                );
            } else {
                debug!("Ignoring redelivered reading for {} at {}", slot, existing.timestamp);
            }
            let severity = classify(&existing);
            return Ok(ReadingReport {
                reading: existing,
                severity,
                duplicate: true,
                outcome: LifecycleOutcome::Unchanged,
            });
        }

        let severity = classify(&reading);
        let outcome = match (self.store.load_open_alert(&slot)?, severity.is_breach()) {
            (None, false) => LifecycleOutcome::Unchanged,
            (None, true) => LifecycleOutcome::Transitioned(self.open(&reading, severity)?),
            (Some(alert), true) => {
                LifecycleOutcome::Transitioned(self.record_breach(alert, &reading, severity)?)
            }
            (Some(alert), false) => self.record_normal(alert, &reading, &classify)?,
        };
        Ok(ReadingReport {
            reading,
            severity,
            duplicate: false,
            outcome,
        })
    }

    fn open(&self, reading: &Reading, severity: Severity) -> Result<AlertUpdate, LifecycleError> {
        let alert = Alert {
            id: AlertId::new(),
            individual_id: reading.individual_id.clone(),
            metric: reading.metric,
            trigger: reading.id,
            severity,
            status: AlertStatus::Open,
            created_at: reading.timestamp,
            last_breach_at: reading.timestamp,
            acknowledged_at: None,
            resolved_at: None,
        };
        let transition = Transition {
            from: None,
            to: AlertStatus::Open,
            severity,
            cause: TransitionCause::Opened,
            reading_id: Some(reading.id),
            at: reading.timestamp,
        };
        info!("Opening {} alert {} for {}", severity, alert.id, alert.slot());
        self.commit(alert, transition)
    }

    /// Breach on an active alert: never downgrades, keeps the status
    fn record_breach(
        &self,
        mut alert: Alert,
        reading: &Reading,
        severity: Severity,
    ) -> Result<AlertUpdate, LifecycleError> {
        let escalated = severity > alert.severity;
        if escalated {
            alert.severity = severity;
            alert.trigger = reading.id;
        }
        alert.last_breach_at = alert.last_breach_at.max(reading.timestamp);

        let cause = if escalated {
            info!("Escalating alert {} to {}", alert.id, severity);
            TransitionCause::Escalated
        } else {
            debug!("Repeat breach on alert {}", alert.id);
            TransitionCause::Repeated
        };
        let transition = Transition {
            from: Some(alert.status),
            to: alert.status,
            severity: alert.severity,
            cause,
            reading_id: Some(reading.id),
            at: reading.timestamp,
        };
        self.commit(alert, transition)
    }

    /// Normal reading on an active alert: count the trailing run of normal
    /// readings after the newest stored breach
    fn record_normal<C>(
        &self,
        mut alert: Alert,
        reading: &Reading,
        classify: &C,
    ) -> Result<LifecycleOutcome, LifecycleError>
    where
        C: Fn(&Reading) -> Severity,
    {
        let required = self.config.resolve_after_normal.max(1);
        let since = alert.last_breach_at;

        // Newest first; stops at the newest breach, applied to this alert or not
        let streak: Vec<DateTime<Utc>> = self
            .store
            .load_recent_readings(&alert.individual_id, alert.metric, since)?
            .iter()
            .rev()
            .filter(|r| r.timestamp > since)
            .take_while(|r| !classify(*r).is_breach())
            .map(|r| r.timestamp)
            .collect();

        let normal_streak = streak.len() as u32;
        if normal_streak < required {
            debug!(
                "Alert {} normal streak {}/{}",
                alert.id, normal_streak, required
            );
            return Ok(LifecycleOutcome::Pending {
                alert_id: alert.id,
                normal_streak,
                required,
            });
        }

        let resolved_at = streak.first().copied().unwrap_or(reading.timestamp);
        let from = alert.status;
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(resolved_at);
        let transition = Transition {
            from: Some(from),
            to: AlertStatus::Resolved,
            severity: alert.severity,
            cause: TransitionCause::ResolvedAutomatically,
            reading_id: Some(reading.id),
            at: resolved_at,
        };
        info!(
            "Alert {} resolved after {} normal readings",
            alert.id, normal_streak
        );
        self.commit(alert, transition).map(LifecycleOutcome::Transitioned)
    }

    /// Caregiver acknowledgement; acknowledging twice is a no-op
    pub fn acknowledge(&self, id: AlertId, at: DateTime<Utc>) -> Result<Alert, LifecycleError> {
        self.with_alert_locked(id, |alert| match alert.status {
            AlertStatus::Acknowledged => Ok(alert),
            AlertStatus::Resolved => Err(LifecycleError::InvalidTransition {
                from: AlertStatus::Resolved,
                to: AlertStatus::Acknowledged,
            }),
            AlertStatus::Open => {
                let mut alert = alert;
                alert.status = AlertStatus::Acknowledged;
                alert.acknowledged_at = Some(at);
                let transition = Transition {
                    from: Some(AlertStatus::Open),
                    to: AlertStatus::Acknowledged,
                    severity: alert.severity,
                    cause: TransitionCause::Acknowledged,
                    reading_id: None,
                    at,
                };
                info!("Alert acknowledged: {}", alert.id);
                self.commit(alert, transition).map(|update| update.alert)
            }
        })
    }

    /// Caregiver resolution of an open or acknowledged alert
    pub fn resolve(&self, id: AlertId, at: DateTime<Utc>) -> Result<Alert, LifecycleError> {
        self.with_alert_locked(id, |alert| {
            let from = alert.status;
            if from == AlertStatus::Resolved {
                return Err(LifecycleError::InvalidTransition {
                    from,
                    to: AlertStatus::Resolved,
                });
            }
            let mut alert = alert;
            alert.status = AlertStatus::Resolved;
            alert.resolved_at = Some(at);
            let transition = Transition {
                from: Some(from),
                to: AlertStatus::Resolved,
                severity: alert.severity,
                cause: TransitionCause::ResolvedByCaregiver,
                reading_id: None,
                at,
            };
            info!("Alert resolved by caregiver: {}", alert.id);
            self.commit(alert, transition).map(|update| update.alert)
        })
    }

    /// Load an alert, take its slot lock, and run `f` on a fresh copy
    fn with_alert_locked<F>(&self, id: AlertId, f: F) -> Result<Alert, LifecycleError>
    where
        F: FnOnce(Alert) -> Result<Alert, LifecycleError>,
    {
        let slot = self
            .store
            .load_alert(id)?
            .ok_or(LifecycleError::AlertNotFound(id))?
            .slot();
        let lock = self.locks.lock_for(&slot)?;
        let _guard = lock
            .lock()
            .map_err(|e| LifecycleError::Lock(format!("Lock error: {}", e)))?;

        let alert = self
            .store
            .load_alert(id)?
            .ok_or(LifecycleError::AlertNotFound(id))?;
        f(alert)
    }

    fn commit(&self, alert: Alert, transition: Transition) -> Result<AlertUpdate, LifecycleError> {
        let cause = transition.cause;
        let entry = self.store.commit_transition(&alert, transition)?;
        counter!("carewatch_alert_transitions_total", "cause" => cause.as_str()).increment(1);

        let notified = self.config.notification.should_notify(&alert, cause);
        if notified {
            self.notifier.notify(&Notification::new(&alert, &entry));
            counter!("carewatch_notifications_total").increment(1);
        }

        Ok(AlertUpdate {
            alert,
            entry,
            notified,
        })
    }
}

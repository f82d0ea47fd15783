//! Caregiver Notification

use care_model::{
    Alert, AlertHistoryEntry, AlertId, IndividualId, MetricKind, Severity, TransitionCause,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Decides which alert transitions page a caregiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPolicy {
    /// Metric kinds whose warning-level alerts also notify
    pub warning_metrics: Vec<MetricKind>,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            warning_metrics: vec![MetricKind::HeartRate],
        }
    }
}

impl NotificationPolicy {
    /// Only openings and escalations notify; repeats, acknowledgements and
    /// resolutions stay quiet
    pub fn should_notify(&self, alert: &Alert, cause: TransitionCause) -> bool {
        match cause {
            TransitionCause::Opened => {
                alert.severity == Severity::Critical
                    || !alert.metric.is_vital_sign()
                    || self.warning_metrics.contains(&alert.metric)
            }
            TransitionCause::Escalated => alert.severity == Severity::Critical,
            _ => false,
        }
    }
}

/// Message delivered to a caregiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub alert_id: AlertId,
    pub individual_id: IndividualId,
    pub metric: MetricKind,
    pub severity: Severity,
    pub cause: TransitionCause,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(alert: &Alert, entry: &AlertHistoryEntry) -> Self {
        let cause = entry.transition.cause;
        let message = format!(
            "ALERT for {}: {} {} ({})",
            alert.individual_id,
            alert.severity,
            alert.metric,
            cause.as_str()
        );
        Self {
            alert_id: alert.id,
            individual_id: alert.individual_id.clone(),
            metric: alert.metric,
            severity: alert.severity,
            cause,
            message,
            at: entry.transition.at,
        }
    }
}

/// Delivery channel for caregiver notifications (SMS, email, app push)
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Notifier that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        warn!(
            alert_id = %notification.alert_id,
            individual = %notification.individual_id,
            "{}",
            notification.message
        );
    }
}

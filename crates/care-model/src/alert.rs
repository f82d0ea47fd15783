//! Alert records and their transition history

use crate::individual::IndividualId;
use crate::metric::{MetricKind, Severity};
use crate::reading::ReadingId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Alert identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The unit at which alert state is tracked: one individual, one metric kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub individual_id: IndividualId,
    pub metric: MetricKind,
}

impl Slot {
    pub fn new(individual_id: IndividualId, metric: MetricKind) -> Self {
        Self {
            individual_id,
            metric,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.individual_id, self.metric)
    }
}

/// Alert status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    /// Open and acknowledged alerts still occupy their slot
    pub fn is_active(self) -> bool {
        !matches!(self, AlertStatus::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert raised for a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub individual_id: IndividualId,
    pub metric: MetricKind,
    /// Reading that last set the alert's severity
    pub trigger: ReadingId,
    pub severity: Severity,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest breaching reading
    pub last_breach_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn slot(&self) -> Slot {
        Slot::new(self.individual_id.clone(), self.metric)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Why a transition happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// First breach on a clean slot
    Opened,
    /// Breach raised the severity of an active alert
    Escalated,
    /// Breach at or below the current severity
    Repeated,
    Acknowledged,
    ResolvedByCaregiver,
    /// Enough consecutive normal readings
    ResolvedAutomatically,
}

impl TransitionCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionCause::Opened => "opened",
            TransitionCause::Escalated => "escalated",
            TransitionCause::Repeated => "repeated",
            TransitionCause::Acknowledged => "acknowledged",
            TransitionCause::ResolvedByCaregiver => "resolved_by_caregiver",
            TransitionCause::ResolvedAutomatically => "resolved_automatically",
        }
    }
}

/// A state change applied to an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// `None` when the transition created the alert
    pub from: Option<AlertStatus>,
    pub to: AlertStatus,
    /// Severity after the transition
    pub severity: Severity,
    pub cause: TransitionCause,
    pub reading_id: Option<ReadingId>,
    pub at: DateTime<Utc>,
}

/// Immutable audit entry, one per transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertHistoryEntry {
    pub alert_id: AlertId,
    /// Position in the alert's history, starting at 0
    pub sequence: u32,
    pub transition: Transition,
}

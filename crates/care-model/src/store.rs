//! Persistence seams
//!
//! The engine never talks to a database directly. Every store returns owned
//! snapshots so evaluation performs no hidden I/O.

use crate::alert::{Alert, AlertHistoryEntry, AlertId, Slot, Transition};
use crate::individual::{Individual, IndividualId};
use crate::metric::MetricKind;
use crate::reading::Reading;
use crate::risk::RiskScore;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Persistence failures, surfaced unchanged to callers
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result of saving a reading
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingSave {
    Inserted,
    /// Same sample was already stored; carries the stored copy
    Duplicate(Reading),
}

pub trait ReadingStore: Send + Sync {
    fn save_reading(&self, reading: &Reading) -> Result<ReadingSave, PersistenceError>;

    /// Readings for one slot with `timestamp >= since`, oldest first
    fn load_recent_readings(
        &self,
        individual_id: &IndividualId,
        metric: MetricKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>, PersistenceError>;
}

pub trait AlertStore: Send + Sync {
    /// The active (open or acknowledged) alert for a slot, if any
    fn load_open_alert(&self, slot: &Slot) -> Result<Option<Alert>, PersistenceError>;

    fn load_alert(&self, id: AlertId) -> Result<Option<Alert>, PersistenceError>;

    /// Alerts for an individual, newest first
    fn load_alerts(
        &self,
        individual_id: &IndividualId,
        active_only: bool,
    ) -> Result<Vec<Alert>, PersistenceError>;

    /// Alerts whose last breach is at or after `since`
    fn load_alerts_since(
        &self,
        individual_id: &IndividualId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Alert>, PersistenceError>;

    fn load_alert_history(&self, id: AlertId) -> Result<Vec<AlertHistoryEntry>, PersistenceError>;

    /// Save the alert and append its history entry as one unit
    fn commit_transition(
        &self,
        alert: &Alert,
        transition: Transition,
    ) -> Result<AlertHistoryEntry, PersistenceError>;
}

pub trait RiskStore: Send + Sync {
    fn save_risk_score(&self, score: &RiskScore) -> Result<(), PersistenceError>;

    /// Score history, oldest first
    fn load_risk_history(
        &self,
        individual_id: &IndividualId,
    ) -> Result<Vec<RiskScore>, PersistenceError>;
}

pub trait IndividualStore: Send + Sync {
    fn save_individual(&self, individual: &Individual) -> Result<(), PersistenceError>;

    fn load_individual(
        &self,
        id: &IndividualId,
    ) -> Result<Option<Individual>, PersistenceError>;
}

/// Everything the monitor needs from persistence
pub trait CareStore: ReadingStore + AlertStore + RiskStore + IndividualStore {}

impl<T> CareStore for T where T: ReadingStore + AlertStore + RiskStore + IndividualStore {}

//! Repository Implementation

use crate::snapshot::Snapshot;
use crate::StorageError;
use care_model::{
    Alert, AlertHistoryEntry, AlertId, AlertStore, Individual, IndividualId, IndividualStore,
    MetricKind, PersistenceError, Reading, ReadingSave, ReadingStore, RiskScore, RiskStore, Slot,
    Transition,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Alerts and their history live under one lock so a transition commits
/// both or neither
#[derive(Debug, Default)]
struct AlertTables {
    alerts: HashMap<AlertId, Alert>,
    history: HashMap<AlertId, Vec<AlertHistoryEntry>>,
    /// Active alert per slot
    active: HashMap<Slot, AlertId>,
}

/// Repository for data access (in-memory)
pub struct Repository {
    /// Readings per slot, oldest first
    readings: Mutex<HashMap<Slot, VecDeque<Reading>>>,
    alerts: Mutex<AlertTables>,
    /// Risk score history per individual, oldest first
    risk_scores: Mutex<HashMap<IndividualId, Vec<RiskScore>>>,
    individuals: Mutex<HashMap<IndividualId, Individual>>,
    /// Max readings retained per slot (~14 days at one reading a minute)
    max_readings_per_slot: usize,
    /// Max risk scores retained per individual
    max_scores_per_individual: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            readings: Mutex::new(HashMap::new()),
            alerts: Mutex::new(AlertTables::default()),
            risk_scores: Mutex::new(HashMap::new()),
            individuals: Mutex::new(HashMap::new()),
            max_readings_per_slot: 20_000,
            max_scores_per_individual: 1_000,
        }
    }

    /// Total readings stored
    pub fn reading_count(&self) -> usize {
        self.readings
            .lock()
            .map(|r| r.values().map(VecDeque::len).sum())
            .unwrap_or(0)
    }

    /// Total alerts stored, resolved included
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|t| t.alerts.len()).unwrap_or(0)
    }

    /// Alerts currently open or acknowledged
    pub fn active_alert_count(&self) -> usize {
        self.alerts.lock().map(|t| t.active.len()).unwrap_or(0)
    }

    /// Export the full repository content
    pub fn export_snapshot(&self) -> Result<Vec<u8>, StorageError> {
        let readings = lock(&self.readings)?
            .values()
            .flat_map(|slot| slot.iter().cloned())
            .collect();
        let (alerts, history) = {
            let tables = lock(&self.alerts)?;
            (
                tables.alerts.values().cloned().collect(),
                tables.history.values().flatten().cloned().collect(),
            )
        };
        let risk_scores = lock(&self.risk_scores)?
            .values()
            .flatten()
            .cloned()
            .collect();
        let individuals = lock(&self.individuals)?.values().cloned().collect();

        let snapshot = Snapshot::new(readings, alerts, history, risk_scores, individuals);
        let bytes = snapshot.encode()?;
        info!("Exported snapshot ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Rebuild a repository from an exported snapshot
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, StorageError> {
        let snapshot = Snapshot::decode(bytes)?;
        let repo = Self::new();

        {
            let mut readings = lock(&repo.readings)?;
            for reading in snapshot.readings {
                let slot = readings.entry(reading.slot()).or_default();
                let at = slot.partition_point(|r| r.timestamp <= reading.timestamp);
                slot.insert(at, reading);
            }
        }
        {
            let mut tables = lock(&repo.alerts)?;
            for alert in snapshot.alerts {
                if alert.is_active() {
                    tables.active.insert(alert.slot(), alert.id);
                }
                tables.alerts.insert(alert.id, alert);
            }
            for entry in snapshot.history {
                tables.history.entry(entry.alert_id).or_default().push(entry);
            }
            for entries in tables.history.values_mut() {
                entries.sort_by_key(|e| e.sequence);
            }
        }
        {
            let mut scores = lock(&repo.risk_scores)?;
            for score in snapshot.risk_scores {
                scores.entry(score.individual_id.clone()).or_default().push(score);
            }
            for history in scores.values_mut() {
                history.sort_by_key(|s| s.computed_at);
            }
        }
        {
            let mut individuals = lock(&repo.individuals)?;
            for individual in snapshot.individuals {
                individuals.insert(individual.id.clone(), individual);
            }
        }

        info!("Restored repository from snapshot");
        Ok(repo)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore for Repository {
    fn save_reading(&self, reading: &Reading) -> Result<ReadingSave, PersistenceError> {
        let mut readings = lock(&self.readings)?;
        let slot = readings.entry(reading.slot()).or_default();

        let at = slot.partition_point(|r| r.timestamp < reading.timestamp);
        if let Some(existing) = slot
            .iter()
            .skip(at)
            .take_while(|r| r.timestamp == reading.timestamp)
            .find(|r| r.same_sample(reading))
        {
            debug!("Duplicate reading for {} at {}", reading.slot(), reading.timestamp);
            return Ok(ReadingSave::Duplicate(existing.clone()));
        }

        slot.insert(at, reading.clone());

        // Enforce retention
        while slot.len() > self.max_readings_per_slot {
            slot.pop_front();
        }

        Ok(ReadingSave::Inserted)
    }

    fn load_recent_readings(
        &self,
        individual_id: &IndividualId,
        metric: MetricKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>, PersistenceError> {
        let readings = lock(&self.readings)?;
        let slot = Slot::new(individual_id.clone(), metric);

        Ok(readings
            .get(&slot)
            .map(|slot| {
                let start = slot.partition_point(|r| r.timestamp < since);
                slot.iter().skip(start).cloned().collect()
            })
            .unwrap_or_default())
    }
}

impl AlertStore for Repository {
    fn load_open_alert(&self, slot: &Slot) -> Result<Option<Alert>, PersistenceError> {
        let tables = lock(&self.alerts)?;
        Ok(tables
            .active
            .get(slot)
            .and_then(|id| tables.alerts.get(id))
            .cloned())
    }

    fn load_alert(&self, id: AlertId) -> Result<Option<Alert>, PersistenceError> {
        Ok(lock(&self.alerts)?.alerts.get(&id).cloned())
    }

    fn load_alerts(
        &self,
        individual_id: &IndividualId,
        active_only: bool,
    ) -> Result<Vec<Alert>, PersistenceError> {
        let tables = lock(&self.alerts)?;
        let mut alerts: Vec<Alert> = tables
            .alerts
            .values()
            .filter(|a| &a.individual_id == individual_id)
            .filter(|a| !active_only || a.is_active())
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    fn load_alerts_since(
        &self,
        individual_id: &IndividualId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Alert>, PersistenceError> {
        let tables = lock(&self.alerts)?;
        let mut alerts: Vec<Alert> = tables
            .alerts
            .values()
            .filter(|a| &a.individual_id == individual_id && a.last_breach_at >= since)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.last_breach_at.cmp(&a.last_breach_at));
        Ok(alerts)
    }

    fn load_alert_history(&self, id: AlertId) -> Result<Vec<AlertHistoryEntry>, PersistenceError> {
        Ok(lock(&self.alerts)?
            .history
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn commit_transition(
        &self,
        alert: &Alert,
        transition: Transition,
    ) -> Result<AlertHistoryEntry, PersistenceError> {
        let mut tables = lock(&self.alerts)?;
        let slot = alert.slot();

        let history = tables.history.entry(alert.id).or_default();
        let entry = AlertHistoryEntry {
            alert_id: alert.id,
            sequence: history.len() as u32,
            transition,
        };
        history.push(entry.clone());

        if alert.is_active() {
            tables.active.insert(slot, alert.id);
        } else if tables.active.get(&slot) == Some(&alert.id) {
            tables.active.remove(&slot);
        }
        tables.alerts.insert(alert.id, alert.clone());

        debug!(
            "Committed alert {} transition #{} ({})",
            alert.id,
            entry.sequence,
            entry.transition.cause.as_str()
        );
        Ok(entry)
    }
}

impl RiskStore for Repository {
    fn save_risk_score(&self, score: &RiskScore) -> Result<(), PersistenceError> {
        let mut scores = lock(&self.risk_scores)?;
        let history = scores.entry(score.individual_id.clone()).or_default();

        // Enforce retention
        if history.len() >= self.max_scores_per_individual {
            history.remove(0);
        }
        history.push(score.clone());
        Ok(())
    }

    fn load_risk_history(
        &self,
        individual_id: &IndividualId,
    ) -> Result<Vec<RiskScore>, PersistenceError> {
        Ok(lock(&self.risk_scores)?
            .get(individual_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl IndividualStore for Repository {
    fn save_individual(&self, individual: &Individual) -> Result<(), PersistenceError> {
        lock(&self.individuals)?.insert(individual.id.clone(), individual.clone());
        Ok(())
    }

    fn load_individual(&self, id: &IndividualId) -> Result<Option<Individual>, PersistenceError> {
        Ok(lock(&self.individuals)?.get(id).cloned())
    }
}

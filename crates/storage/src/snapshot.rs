//! Postcard snapshots of repository content

use crate::StorageError;
use care_model::{Alert, AlertHistoryEntry, Individual, Reading, RiskScore};
use serde::{Deserialize, Serialize};

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// Full repository content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub readings: Vec<Reading>,
    pub alerts: Vec<Alert>,
    pub history: Vec<AlertHistoryEntry>,
    pub risk_scores: Vec<RiskScore>,
    pub individuals: Vec<Individual>,
}

impl Snapshot {
    pub fn new(
        readings: Vec<Reading>,
        alerts: Vec<Alert>,
        history: Vec<AlertHistoryEntry>,
        risk_scores: Vec<RiskScore>,
        individuals: Vec<Individual>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            readings,
            alerts,
            history,
            risk_scores,
            individuals,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        postcard::to_allocvec(self).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let snapshot: Snapshot = postcard::from_bytes(bytes)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StorageError::SerializationError(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

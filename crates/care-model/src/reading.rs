//! Readings

use crate::alert::Slot;
use crate::individual::IndividualId;
use crate::metric::MetricKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reading identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingId(Uuid);

impl ReadingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReadingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One immutable sample for a tracked individual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: ReadingId,
    pub individual_id: IndividualId,
    pub metric: MetricKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(
        individual_id: impl Into<IndividualId>,
        metric: MetricKind,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReadingId::new(),
            individual_id: individual_id.into(),
            metric,
            value,
            timestamp,
        }
    }

    /// The (individual, metric kind) slot this reading belongs to
    pub fn slot(&self) -> Slot {
        Slot::new(self.individual_id.clone(), self.metric)
    }

    /// Whether two readings are deliveries of the same sample
    pub fn same_sample(&self, other: &Reading) -> bool {
        self.individual_id == other.individual_id
            && self.metric == other.metric
            && self.timestamp == other.timestamp
    }
}

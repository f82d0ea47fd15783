//! Tracked individuals

use crate::bands::MetricBands;
use crate::metric::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a tracked person (device/user id, e.g. `D1000`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(String);

impl IndividualId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndividualId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An enrolled individual with optional per-metric threshold overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub name: String,
    #[serde(default)]
    pub thresholds: BTreeMap<MetricKind, MetricBands>,
}

impl Individual {
    pub fn new(id: impl Into<IndividualId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            thresholds: BTreeMap::new(),
        }
    }

    /// Builder-style override for one metric kind
    pub fn with_threshold(mut self, metric: MetricKind, bands: MetricBands) -> Self {
        self.thresholds.insert(metric, bands);
        self
    }

    pub fn threshold_override(&self, metric: MetricKind) -> Option<&MetricBands> {
        self.thresholds.get(&metric)
    }
}

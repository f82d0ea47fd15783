//! CareWatch Data Model
//!
//! Shared types passed between ingest, evaluation, alerting and scoring,
//! plus the persistence traits the engine is written against.

mod alert;
mod bands;
mod individual;
mod metric;
mod reading;
mod risk;
pub mod store;

pub use alert::{
    Alert, AlertHistoryEntry, AlertId, AlertStatus, Slot, Transition, TransitionCause,
};
pub use bands::{Band, MetricBands};
pub use individual::{Individual, IndividualId};
pub use metric::{MetricKind, Severity};
pub use reading::{Reading, ReadingId};
pub use risk::{RiskFactor, RiskLevel, RiskScore};
pub use store::{
    AlertStore, CareStore, IndividualStore, PersistenceError, ReadingSave, ReadingStore,
    RiskStore,
};

//! Lifecycle Error Types

use care_model::{AlertId, AlertStatus, PersistenceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Alert not found: {0}")]
    AlertNotFound(AlertId),

    #[error("Invalid alert transition from {from} to {to}")]
    InvalidTransition { from: AlertStatus, to: AlertStatus },

    #[error("Slot lock error: {0}")]
    Lock(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

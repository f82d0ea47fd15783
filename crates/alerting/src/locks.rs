//! Per-slot mutual exclusion

use crate::error::LifecycleError;
use care_model::Slot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one mutex per (individual, metric kind) slot
///
/// Racing readings for the same slot are serialized so only one of them can
/// open an alert; different slots proceed in parallel.
#[derive(Debug, Default)]
pub struct SlotLocks {
    slots: Mutex<HashMap<Slot, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `slot`, created on first use
    pub fn lock_for(&self, slot: &Slot) -> Result<Arc<Mutex<()>>, LifecycleError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| LifecycleError::Lock(format!("Lock error: {}", e)))?;
        Ok(slots.entry(slot.clone()).or_default().clone())
    }
}

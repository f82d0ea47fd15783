//! Alerting System
//!
//! Turns classified readings into alert records, deduplicates repeats per
//! slot, tracks acknowledgement and resolution, and decides which
//! transitions page a caregiver.

mod error;
mod locks;
mod manager;
mod notify;

pub use error::LifecycleError;
pub use locks::SlotLocks;
pub use manager::{AlertConfig, AlertManager, AlertUpdate, LifecycleOutcome, ReadingReport};
pub use notify::{Notification, NotificationPolicy, Notifier, TracingNotifier};

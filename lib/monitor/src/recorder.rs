use chrono::Utc;
use driftwatch_core::{DriftEvent, EventType};
use driftwatch_storage::EventLog;
use tracing::{error, info};

/// Writes audit events; a failed write is reported but never fails the cycle.
pub struct EventRecorder<'a, L: ?Sized> {
    log: &'a L,
}

impl<'a, L: EventLog + ?Sized> EventRecorder<'a, L> {
    pub fn new(log: &'a L) -> Self {
        Self { log }
    }

    /// Append one event stamped with the current time.
    /// Returns whether it reached the log.
    pub fn record(
        &self,
        event_type: EventType,
        severity: f64,
        details: &str,
        action_taken: &str,
    ) -> bool {
        let event = DriftEvent::new(event_type, severity, details, action_taken, Utc::now());

        match self.log.append(&event) {
            Ok(()) => {
                info!(event_id = %event.id, event_type = %event_type, severity, "Drift event recorded");
                true
            }
            Err(e) => {
                error!(
                    event_type = %event_type,
                    severity,
                    error = %e,
                    "Failed to record drift event; the audit trail is missing this cycle"
                );
                false
            }
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of outcome recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Drift detected and a new model was fitted
    ModelRetraining,
    /// Drift detected but the trainer failed
    RetrainingFailed,
    /// Drift detected but there was nothing to train on
    InsufficientData,
    /// No drift; only recorded when configured to
    Stable,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ModelRetraining => "model_retraining",
            EventType::RetrainingFailed => "retraining_failed",
            EventType::InsufficientData => "insufficient_data",
            EventType::Stable => "stable",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftEvent {
    pub id: Uuid,
    pub event_type: EventType,
    pub severity_score: f64,
    pub details: String,
    pub action_taken: String,
    pub timestamp: DateTime<Utc>,
}

impl DriftEvent {
    #[must_use]
    pub fn new(
        event_type: EventType,
        severity_score: f64,
        details: impl Into<String>,
        action_taken: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            severity_score,
            details: details.into(),
            action_taken: action_taken.into(),
            timestamp,
        }
    }
}

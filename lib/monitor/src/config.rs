use chrono::{DateTime, Duration, Utc};
use driftwatch_core::{Error, Result};

pub const DEFAULT_THRESHOLD: f64 = 0.1;
pub const DEFAULT_DAYS_AGO: u32 = 7;
pub const DEFAULT_REFERENCE_LIMIT: usize = 100;

/// Settings for one monitor process. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Scores strictly above this are drift
    pub threshold: f64,
    /// Width of the recent window in days
    pub days_ago: u32,
    /// Cap on the reference population; `None` reads everything
    pub reference_limit: Option<usize>,
    /// Process-wide embedding dimensionality, when known up front
    pub vector_dim: Option<usize>,
    /// Also write a `stable` event when no drift is found
    pub record_stable: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            days_ago: DEFAULT_DAYS_AGO,
            reference_limit: Some(DEFAULT_REFERENCE_LIMIT),
            vector_dim: None,
            record_stable: false,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.days_ago == 0 {
            return Err(Error::InvalidConfig("days_ago must be at least 1".to_string()));
        }
        if self.reference_limit == Some(0) {
            return Err(Error::InvalidConfig(
                "reference_limit must be positive when set".to_string(),
            ));
        }
        if self.vector_dim == Some(0) {
            return Err(Error::InvalidConfig("vector_dim must be positive when set".to_string()));
        }
        Ok(())
    }

    /// Boundary between the reference and recent windows
    pub fn recent_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.days_ago))
    }
}

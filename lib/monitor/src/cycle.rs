//! The evaluation cycle
//!
//! ```text
//! fetch reference ─┐
//!                  ├─> score ─> decide ─┬─ drift ──> retrain ─> record
//! fetch recent ────┘                    └─ stable ─> (record if configured)
//! ```
//!
//! One call to [`DriftMonitor::run_cycle`] is one cycle. Cycles share no
//! state; callers are responsible for not running two at once.

use chrono::{DateTime, Utc};
use driftwatch_core::{DriftDecision, DriftPolicy, EventType, ModelTrainer, Result, VectorPopulation};
use driftwatch_storage::{EventLog, VectorStore};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::fetcher::PopulationFetcher;
use crate::orchestrator::{RetrainingOrchestrator, RetrainingOutcome};
use crate::recorder::EventRecorder;

/// Final state of one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Disposition {
    /// One of the populations was empty
    NoData,
    Stable,
    Retrained { artifact: String, accuracy: f64 },
    InsufficientData,
    RetrainingFailed { reason: String },
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::NoData => f.write_str("stable (no data to compare)"),
            Disposition::Stable => f.write_str("stable"),
            Disposition::Retrained { artifact, accuracy } => {
                write!(f, "drift detected + retrained ({}, accuracy {:.4})", artifact, accuracy)
            }
            Disposition::InsufficientData => f.write_str("drift detected, insufficient data to retrain"),
            Disposition::RetrainingFailed { reason } => {
                write!(f, "drift detected, retraining failed: {}", reason)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub reference_count: usize,
    pub recent_count: usize,
    pub threshold: f64,
    pub decision: DriftDecision,
    pub disposition: Disposition,
    /// Whether an audit event was written for this cycle
    pub event_recorded: bool,
}

/// Drift monitor wired to a vector store, an event log and a trainer
pub struct DriftMonitor<S, L, T> {
    config: MonitorConfig,
    policy: DriftPolicy,
    store: S,
    events: L,
    trainer: T,
}

impl<S, L, T> DriftMonitor<S, L, T>
where
    S: VectorStore,
    L: EventLog,
    T: ModelTrainer,
{
    pub fn new(config: MonitorConfig, store: S, events: L, trainer: T) -> Result<Self> {
        config.validate()?;
        let policy = DriftPolicy::new(config.threshold)?;
        Ok(Self {
            config,
            policy,
            store,
            events,
            trainer,
        })
    }

    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn events(&self) -> &L {
        &self.events
    }

    pub fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_at(Utc::now())
    }

    /// Run one cycle with `now` as the window anchor.
    ///
    /// Errors are limited to fatal input problems (ragged or malformed
    /// embeddings); store, trainer and audit failures are absorbed and
    /// show up in the report.
    pub fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("drift_cycle", %cycle_id);
        let _enter = span.enter();
        let started = Instant::now();

        let fetcher = PopulationFetcher::new(&self.store, &self.config);
        let reference = fetcher.reference(now)?;
        let recent = fetcher.recent(now)?;

        let decision = self.policy.evaluate(&reference, &recent)?;
        info!(
            score = decision.score.value(),
            threshold = self.policy.threshold(),
            is_drift = decision.is_drift,
            reference = reference.len(),
            recent = recent.len(),
            "Drift score computed"
        );

        let (disposition, event_recorded) = if decision.is_drift {
            self.handle_drift(&decision, &reference, &recent)?
        } else {
            self.handle_stable(&decision, &reference, &recent)
        };

        info!(
            disposition = %disposition,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle_id,
            evaluated_at: now,
            reference_count: reference.len(),
            recent_count: recent.len(),
            threshold: self.policy.threshold(),
            decision,
            disposition,
            event_recorded,
        })
    }

    fn summary(&self, decision: &DriftDecision, reference: &VectorPopulation, recent: &VectorPopulation) -> String {
        let relation = if decision.is_drift { "exceeded" } else { "within" };
        format!(
            "Drift score {} {} threshold {:.4} (reference={}, recent={}, window={}d)",
            decision.score,
            relation,
            self.policy.threshold(),
            reference.len(),
            recent.len(),
            self.config.days_ago,
        )
    }

    fn handle_drift(
        &self,
        decision: &DriftDecision,
        reference: &VectorPopulation,
        recent: &VectorPopulation,
    ) -> Result<(Disposition, bool)> {
        debug_assert!(
            !reference.is_empty() && !recent.is_empty(),
            "drift is only decided over two non-empty populations"
        );
        let orchestrator = RetrainingOrchestrator::new(&self.trainer);
        let recorder = EventRecorder::new(&self.events);
        let details = self.summary(decision, reference, recent);
        let severity = decision.score.value();

        let result = match orchestrator.retrain(reference, recent)? {
            RetrainingOutcome::Retrained(result) => {
                let action = format!(
                    "Retrained model on {} vectors: {} (accuracy {:.4})",
                    reference.len() + recent.len(),
                    result.artifact,
                    result.accuracy
                );
                let recorded = recorder.record(EventType::ModelRetraining, severity, &details, &action);
                (
                    Disposition::Retrained {
                        artifact: result.artifact,
                        accuracy: result.accuracy,
                    },
                    recorded,
                )
            }
            // unreachable from run_cycle_at: a drift decision implies both
            // populations are non-empty; covered by the orchestrator's own tests
            RetrainingOutcome::InsufficientData => {
                let recorded = recorder.record(
                    EventType::InsufficientData,
                    severity,
                    &details,
                    "Skipped retraining: no vectors available",
                );
                (Disposition::InsufficientData, recorded)
            }
            RetrainingOutcome::Failed(reason) => {
                let action = format!("Retraining failed: {}", reason);
                let recorded = recorder.record(EventType::RetrainingFailed, severity, &details, &action);
                (Disposition::RetrainingFailed { reason }, recorded)
            }
        };

        Ok(result)
    }

    fn handle_stable(
        &self,
        decision: &DriftDecision,
        reference: &VectorPopulation,
        recent: &VectorPopulation,
    ) -> (Disposition, bool) {
        let disposition = if reference.is_empty() || recent.is_empty() {
            Disposition::NoData
        } else {
            Disposition::Stable
        };

        if !self.config.record_stable {
            return (disposition, false);
        }

        let details = match disposition {
            Disposition::NoData => format!(
                "Nothing to compare (reference={}, recent={}, window={}d)",
                reference.len(),
                recent.len(),
                self.config.days_ago
            ),
            _ => self.summary(decision, reference, recent),
        };
        let recorded = EventRecorder::new(&self.events).record(
            EventType::Stable,
            decision.score.value(),
            &details,
            "No action",
        );
        (disposition, recorded)
    }
}

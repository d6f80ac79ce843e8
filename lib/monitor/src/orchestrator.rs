use driftwatch_core::{ModelTrainer, Result, RetrainingResult, VectorPopulation};
use std::time::Instant;
use tracing::{error, info, warn};

/// What happened when retraining was attempted
#[derive(Debug, Clone, PartialEq)]
pub enum RetrainingOutcome {
    Retrained(RetrainingResult),
    /// Merged population was empty; the trainer was not called
    InsufficientData,
    /// The trainer raised; carries its message
    Failed(String),
}

/// Runs the trainer over everything seen so far.
pub struct RetrainingOrchestrator<'a, T: ?Sized> {
    trainer: &'a T,
}

impl<'a, T: ModelTrainer + ?Sized> RetrainingOrchestrator<'a, T> {
    pub fn new(trainer: &'a T) -> Self {
        Self { trainer }
    }

    /// Merge both populations and fit a new model on the result.
    ///
    /// Only a dimension mismatch between the two populations is returned as
    /// an error; trainer failures come back as [`RetrainingOutcome::Failed`].
    pub fn retrain(
        &self,
        reference: &VectorPopulation,
        recent: &VectorPopulation,
    ) -> Result<RetrainingOutcome> {
        let merged = VectorPopulation::merge(reference, recent)?;

        if merged.is_empty() {
            warn!("Merged training population is empty, skipping retraining");
            return Ok(RetrainingOutcome::InsufficientData);
        }

        info!(
            vectors = merged.len(),
            reference = reference.len(),
            recent = recent.len(),
            "Retraining on merged population"
        );

        let started = Instant::now();
        match self.trainer.train(&merged) {
            Ok(result) => {
                info!(
                    artifact = %result.artifact,
                    accuracy = result.accuracy,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Retraining finished"
                );
                Ok(RetrainingOutcome::Retrained(result))
            }
            Err(e) => {
                error!(
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Retraining failed"
                );
                Ok(RetrainingOutcome::Failed(e.to_string()))
            }
        }
    }
}

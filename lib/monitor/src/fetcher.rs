//! Population fetcher
//!
//! Turns the two window queries into [`VectorPopulation`]s. A store that
//! cannot be reached yields an empty population (the cycle then reports
//! "no data" rather than crashing); bad data is still an error.

use chrono::{DateTime, Utc};
use driftwatch_core::{EmbeddingVector, PopulationLabel, Result, VectorPopulation};
use driftwatch_storage::{TimePredicate, VectorStore};
use tracing::{debug, error};

use crate::config::MonitorConfig;

pub struct PopulationFetcher<'a, S: ?Sized> {
    store: &'a S,
    config: &'a MonitorConfig,
}

impl<'a, S: VectorStore + ?Sized> PopulationFetcher<'a, S> {
    pub fn new(store: &'a S, config: &'a MonitorConfig) -> Self {
        Self { store, config }
    }

    /// Vectors newer than the window boundary, uncapped
    pub fn recent(&self, now: DateTime<Utc>) -> Result<VectorPopulation> {
        let cutoff = self.config.recent_cutoff(now);
        self.fetch(PopulationLabel::Recent, TimePredicate::After(cutoff), None)
    }

    /// Vectors older than the window boundary, capped by `reference_limit`
    pub fn reference(&self, now: DateTime<Utc>) -> Result<VectorPopulation> {
        let cutoff = self.config.recent_cutoff(now);
        self.fetch(
            PopulationLabel::Reference,
            TimePredicate::Before(cutoff),
            self.config.reference_limit,
        )
    }

    fn fetch(
        &self,
        label: PopulationLabel,
        predicate: TimePredicate,
        limit: Option<usize>,
    ) -> Result<VectorPopulation> {
        debug!(population = %label, ?predicate, ?limit, "Fetching population");

        let rows = match self.store.fetch(predicate, limit) {
            Ok(rows) => rows,
            Err(e) => {
                error!(population = %label, error = %e, "Store read failed, continuing with an empty population");
                return Ok(VectorPopulation::empty(label));
            }
        };

        let vectors = rows
            .into_iter()
            .map(|row| EmbeddingVector::try_from(row.embedding))
            .collect::<Result<Vec<_>>>()?;

        let population = VectorPopulation::new(label, vectors)?;
        if let Some(expected) = self.config.vector_dim {
            population.ensure_dim(expected)?;
        }

        debug!(population = %label, count = population.len(), dim = ?population.dim(), "Population ready");
        Ok(population)
    }
}

//! Synthetic embeddings for exercising the monitor end to end.
//!
//! Writes an old batch centred on one value and a fresh batch centred on
//! another, so a default-configured cycle sees drift.

use chrono::{DateTime, Duration, Utc};
use driftwatch_core::{Error, Result};
use driftwatch_storage::{EmbeddingRecord, VectorStore};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::info;

pub const DEFAULT_VECTOR_DIM: usize = 1536;

#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    pub reference_count: usize,
    pub recent_count: usize,
    pub reference_center: f64,
    pub recent_center: f64,
    /// Standard deviation of every component
    pub noise: f64,
    pub dim: usize,
    pub reference_age_days: u32,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            reference_count: 50,
            recent_count: 20,
            reference_center: 0.0,
            recent_center: 0.5,
            noise: 0.1,
            dim: DEFAULT_VECTOR_DIM,
            reference_age_days: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub reference: usize,
    pub recent: usize,
}

/// One vector with every component drawn from `Normal(center, noise)`
pub fn generate_embedding<R: Rng + ?Sized>(center: f64, noise: f64, dim: usize, rng: &mut R) -> Result<Vec<f64>> {
    // Normal::new accepts a negative std_dev and mirrors the samples
    if !noise.is_finite() || noise < 0.0 {
        return Err(Error::InvalidConfig(format!("noise must be a non-negative number, got {}", noise)));
    }
    let normal = Normal::new(center, noise)
        .map_err(|e| Error::InvalidConfig(format!("noise {}: {}", noise, e)))?;
    Ok((0..dim).map(|_| normal.sample(rng)).collect())
}

fn batch<R: Rng + ?Sized>(
    count: usize,
    center: f64,
    plan: &SeedPlan,
    timestamp: DateTime<Utc>,
    content: &str,
    rng: &mut R,
) -> Result<Vec<EmbeddingRecord>> {
    (0..count)
        .map(|_| {
            Ok(EmbeddingRecord {
                content: content.to_string(),
                kind: "query".to_string(),
                timestamp,
                embedding: generate_embedding(center, plan.noise, plan.dim, rng)?,
            })
        })
        .collect()
}

/// Insert the reference batch (dated `reference_age_days` before `now`)
/// followed by the recent batch (dated `now`).
pub fn seed<S, R>(store: &S, plan: &SeedPlan, now: DateTime<Utc>, rng: &mut R) -> Result<SeedSummary>
where
    S: VectorStore + ?Sized,
    R: Rng + ?Sized,
{
    if plan.dim == 0 {
        return Err(Error::InvalidConfig("seed dimension must be positive".to_string()));
    }

    if !plan.noise.is_finite() || plan.noise < 0.0 {
        return Err(Error::InvalidConfig(format!("noise must be a non-negative number, got {}", plan.noise)));
    }

    let old = now - Duration::days(i64::from(plan.reference_age_days));
    info!(count = plan.reference_count, timestamp = %old, center = plan.reference_center, "Seeding reference batch");
    let reference = batch(
        plan.reference_count,
        plan.reference_center,
        plan,
        old,
        "Typical question about the business",
        rng,
    )?;
    let reference = store.insert(&reference)?;

    info!(count = plan.recent_count, timestamp = %now, center = plan.recent_center, "Seeding recent batch");
    let recent = batch(
        plan.recent_count,
        plan.recent_center,
        plan,
        now,
        "Off-topic question about cooking or video games",
        rng,
    )?;
    let recent = store.insert(&recent)?;

    Ok(SeedSummary { reference, recent })
}

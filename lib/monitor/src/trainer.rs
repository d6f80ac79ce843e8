//! Default model trainer
//!
//! Fits a centroid profile: the mean direction of the training split plus
//! the cosine radius that covers `coverage_quantile` of it. Accuracy is the
//! share of held-out vectors that land inside that radius. The profile needs
//! no labels; supervised trainers plug into the same [`ModelTrainer`] seam
//! and bring their own feedback source.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use driftwatch_core::{
    EmbeddingVector, Error, ModelTrainer, PopulationLabel, Result, RetrainingResult, VectorPopulation,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MODEL_KIND: &str = "centroid_profile";

/// Absorbs rounding noise when comparing distances against the radius
const RADIUS_TOLERANCE: f64 = 1e-12;

/// Serialized model written next to its `.sha256` checksum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidProfile {
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub dim: usize,
    pub training_size: usize,
    pub holdout_size: usize,
    pub radius: f64,
    pub accuracy: f64,
    pub centroid: Vec<f64>,
}

impl CentroidProfile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Whether `vector` falls inside the fitted radius
    pub fn covers(&self, vector: &EmbeddingVector) -> bool {
        EmbeddingVector::from_slice(&self.centroid).cosine_distance(vector) <= self.radius + RADIUS_TOLERANCE
    }
}

pub struct CentroidProfileTrainer {
    models_dir: PathBuf,
    holdout_fraction: f64,
    coverage_quantile: f64,
    seed: Option<u64>,
}

impl CentroidProfileTrainer {
    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.as_ref().to_path_buf(),
            holdout_fraction: 0.2,
            coverage_quantile: 0.95,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction.clamp(0.0, 0.9);
        self
    }

    #[must_use]
    pub fn with_coverage_quantile(mut self, quantile: f64) -> Self {
        self.coverage_quantile = quantile.clamp(0.0, 1.0);
        self
    }

    /// Fix the shuffle so the split is reproducible
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[inline]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    fn fit(&self, population: &VectorPopulation) -> Result<CentroidProfile> {
        let n = population.len();
        if n < 2 {
            return Err(Error::Training(format!(
                "need at least 2 vectors to fit and evaluate, got {}",
                n
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng());

        let holdout = ((n as f64 * self.holdout_fraction).round() as usize).clamp(1, n - 1);
        let (test_idx, train_idx) = indices.split_at(holdout);
        let vectors = population.vectors();

        let train = VectorPopulation::new(
            PopulationLabel::Training,
            train_idx.iter().map(|&i| vectors[i].clone()).collect(),
        )?;
        let centroid = train.centroid()?;

        let mut distances: Vec<f64> = train.iter().map(|v| centroid.cosine_distance(v)).collect();
        let radius = quantile(&mut distances, self.coverage_quantile);

        let covered = test_idx
            .iter()
            .filter(|&&i| centroid.cosine_distance(&vectors[i]) <= radius + RADIUS_TOLERANCE)
            .count();

        Ok(CentroidProfile {
            kind: MODEL_KIND.to_string(),
            created_at: Utc::now(),
            dim: centroid.dim(),
            training_size: train.len(),
            holdout_size: test_idx.len(),
            radius,
            accuracy: covered as f64 / test_idx.len() as f64,
            centroid: centroid.into_inner(),
        })
    }

    fn persist(&self, profile: &CentroidProfile) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.models_dir)?;

        let version = profile.created_at.format("%Y%m%d_%H%M%S_%3f");
        let path = self.models_dir.join(format!("model_{}.json", version));
        let bytes = serde_json::to_vec_pretty(profile)?;
        let checksum = format!("{:x}", Sha256::digest(&bytes));

        AtomicFile::new(&path, OverwriteBehavior::DisallowOverwrite)
            .write(|f| f.write_all(&bytes))
            .map_err(|e| Error::Training(format!("writing {}: {}", path.display(), e)))?;

        let checksum_path = path.with_extension("json.sha256");
        AtomicFile::new(&checksum_path, OverwriteBehavior::AllowOverwrite)
            .write(|f| writeln!(f, "{}  {}", checksum, file_name(&path)))
            .map_err(|e| Error::Training(format!("writing {}: {}", checksum_path.display(), e)))?;

        info!(artifact = %path.display(), sha256 = %checksum, "Model artifact written");
        Ok(path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Nearest-rank quantile; `values` must be non-empty
fn quantile(values: &mut [f64], q: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (q * values.len() as f64).ceil() as usize;
    values[rank.clamp(1, values.len()) - 1]
}

impl ModelTrainer for CentroidProfileTrainer {
    fn train(&self, population: &VectorPopulation) -> Result<RetrainingResult> {
        let profile = self.fit(population)?;
        let path = self.persist(&profile)?;
        Ok(RetrainingResult {
            artifact: path.display().to_string(),
            accuracy: profile.accuracy,
        })
    }
}

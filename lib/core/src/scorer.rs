//! Centroid cosine drift scoring
//!
//! The drift score between two populations is the cosine distance between
//! their centroids: `1 - cos(c_ref, c_recent)`, in `[0, 2]`.
//! 0 means the populations point the same way, 1 orthogonal, 2 opposite.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::population::VectorPopulation;
use crate::{Error, Result};

/// Distributional distance between two populations, always in `[0, 2]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriftScore(f64);

impl DriftScore {
    pub const ZERO: DriftScore = DriftScore(0.0);

    /// Clamp into the valid range; NaN collapses to zero.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 2.0))
    }

    /// Like [`DriftScore::new`], but a NaN or infinite input is an error
    /// instead of a silent zero.
    pub fn try_new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::NonFiniteScore(format!("cosine distance evaluated to {}", value)));
        }
        Ok(Self::new(value))
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for DriftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Stateless scorer over two non-empty populations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftScorer;

impl DriftScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `recent` against `reference`.
    ///
    /// Callers must not pass empty populations; those short-circuit to
    /// "no drift" in [`crate::DriftPolicy::evaluate`] before reaching here.
    pub fn score(&self, reference: &VectorPopulation, recent: &VectorPopulation) -> Result<DriftScore> {
        if reference.is_empty() {
            return Err(Error::EmptyPopulation(reference.label()));
        }
        if recent.is_empty() {
            return Err(Error::EmptyPopulation(recent.label()));
        }

        if let (Some(expected), Some(actual)) = (reference.dim(), recent.dim()) {
            if expected != actual {
                return Err(Error::InvalidDimension { expected, actual });
            }
        }

        let reference_centroid = reference.centroid()?;
        let recent_centroid = recent.centroid()?;

        DriftScore::try_new(reference_centroid.cosine_distance(&recent_centroid))
    }
}

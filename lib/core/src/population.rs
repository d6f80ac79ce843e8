use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vector::EmbeddingVector;
use crate::{Error, Result};

/// Semantic role of a population within one evaluation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationLabel {
    /// Historical vectors older than the recent window
    Reference,
    /// Vectors inside the recent window
    Recent,
    /// Reference and recent vectors merged for retraining
    Training,
}

impl PopulationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationLabel::Reference => "reference",
            PopulationLabel::Recent => "recent",
            PopulationLabel::Training => "training",
        }
    }
}

impl fmt::Display for PopulationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, read-only collection of equally sized embedding vectors
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPopulation {
    label: PopulationLabel,
    vectors: Vec<EmbeddingVector>,
}

impl VectorPopulation {
    /// Build a population, rejecting ragged input.
    pub fn new(label: PopulationLabel, vectors: Vec<EmbeddingVector>) -> Result<Self> {
        if let Some(first) = vectors.first() {
            let expected = first.dim();
            if let Some(bad) = vectors.iter().find(|v| v.dim() != expected) {
                return Err(Error::InvalidDimension {
                    expected,
                    actual: bad.dim(),
                });
            }
        }
        Ok(Self { label, vectors })
    }

    #[must_use]
    pub fn empty(label: PopulationLabel) -> Self {
        Self {
            label,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn label(&self) -> PopulationLabel {
        self.label
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Shared dimensionality, `None` for an empty population
    #[inline]
    pub fn dim(&self) -> Option<usize> {
        self.vectors.first().map(EmbeddingVector::dim)
    }

    #[inline]
    pub fn vectors(&self) -> &[EmbeddingVector] {
        &self.vectors
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmbeddingVector> {
        self.vectors.iter()
    }

    /// Fail unless the population matches `expected` dimensions.
    /// Empty populations match anything.
    pub fn ensure_dim(&self, expected: usize) -> Result<()> {
        match self.dim() {
            Some(actual) if actual != expected => Err(Error::InvalidDimension { expected, actual }),
            _ => Ok(()),
        }
    }

    /// Element-wise arithmetic mean of the raw vectors.
    ///
    /// Vectors are not normalized before averaging, so longer vectors pull
    /// the centroid harder than short ones.
    pub fn centroid(&self) -> Result<EmbeddingVector> {
        let dim = self.dim().ok_or(Error::EmptyPopulation(self.label))?;

        // divide before summing so large components cannot overflow
        let n = self.vectors.len() as f64;
        let mut mean = vec![0.0f64; dim];
        for v in &self.vectors {
            for (acc, x) in mean.iter_mut().zip(v.as_slice()) {
                *acc += x / n;
            }
        }

        Ok(EmbeddingVector::new(mean))
    }

    /// Concatenate reference then recent into one training population.
    /// No deduplication or reweighting.
    pub fn merge(reference: &VectorPopulation, recent: &VectorPopulation) -> Result<Self> {
        if let (Some(expected), Some(actual)) = (reference.dim(), recent.dim()) {
            if expected != actual {
                return Err(Error::InvalidDimension { expected, actual });
            }
        }

        let mut vectors = Vec::with_capacity(reference.len() + recent.len());
        vectors.extend(reference.vectors.iter().cloned());
        vectors.extend(recent.vectors.iter().cloned());

        Ok(Self {
            label: PopulationLabel::Training,
            vectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop(label: PopulationLabel, rows: &[&[f64]]) -> VectorPopulation {
        VectorPopulation::new(
            label,
            rows.iter().map(|r| EmbeddingVector::from_slice(r)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_ragged_population_rejected() {
        let err = VectorPopulation::new(
            PopulationLabel::Recent,
            vec![
                EmbeddingVector::new(vec![1.0, 2.0]),
                EmbeddingVector::new(vec![1.0, 2.0, 3.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidDimension {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_centroid_is_raw_mean() {
        let p = pop(PopulationLabel::Reference, &[&[2.0, 0.0], &[0.0, 4.0]]);
        assert_eq!(p.centroid().unwrap().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_centroid_of_empty_population() {
        let p = VectorPopulation::empty(PopulationLabel::Recent);
        assert!(matches!(
            p.centroid(),
            Err(Error::EmptyPopulation(PopulationLabel::Recent))
        ));
    }

    #[test]
    fn test_merge_preserves_order() {
        let reference = pop(PopulationLabel::Reference, &[&[1.0, 0.0], &[2.0, 0.0]]);
        let recent = pop(PopulationLabel::Recent, &[&[3.0, 0.0]]);

        let merged = VectorPopulation::merge(&reference, &recent).unwrap();
        assert_eq!(merged.label(), PopulationLabel::Training);
        assert_eq!(merged.len(), reference.len() + recent.len());
        let firsts: Vec<f64> = merged.iter().map(|v| v.as_slice()[0]).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_merge_with_empty_side() {
        let reference = VectorPopulation::empty(PopulationLabel::Reference);
        let recent = pop(PopulationLabel::Recent, &[&[3.0, 0.0]]);
        let merged = VectorPopulation::merge(&reference, &recent).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_merge_dimension_mismatch() {
        let reference = pop(PopulationLabel::Reference, &[&[1.0, 0.0]]);
        let recent = pop(PopulationLabel::Recent, &[&[1.0, 0.0, 0.0]]);
        assert!(VectorPopulation::merge(&reference, &recent).is_err());
    }

    #[test]
    fn test_ensure_dim() {
        let p = pop(PopulationLabel::Recent, &[&[1.0, 0.0]]);
        assert!(p.ensure_dim(2).is_ok());
        assert!(p.ensure_dim(3).is_err());
        assert!(VectorPopulation::empty(PopulationLabel::Recent)
            .ensure_dim(3)
            .is_ok());
    }
}

use serde::{Deserialize, Serialize};

use crate::population::VectorPopulation;
use crate::scorer::{DriftScore, DriftScorer};
use crate::{Error, Result};

/// Outcome of applying the threshold to a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftDecision {
    pub is_drift: bool,
    pub score: DriftScore,
}

impl DriftDecision {
    /// Decision used when either population is empty
    #[must_use]
    pub fn no_data() -> Self {
        Self {
            is_drift: false,
            score: DriftScore::ZERO,
        }
    }
}

/// Strict threshold test: a score equal to the threshold is not drift.
#[inline]
pub fn decide(score: DriftScore, threshold: f64) -> DriftDecision {
    DriftDecision {
        is_drift: score.value() > threshold,
        score,
    }
}

/// Static, operator-supplied threshold policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftPolicy {
    threshold: f64,
    scorer: DriftScorer,
}

impl DriftPolicy {
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "drift threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        Ok(Self {
            threshold,
            scorer: DriftScorer::new(),
        })
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn decide(&self, score: DriftScore) -> DriftDecision {
        decide(score, self.threshold)
    }

    /// Score and decide, skipping the scorer when there is nothing to compare.
    pub fn evaluate(
        &self,
        reference: &VectorPopulation,
        recent: &VectorPopulation,
    ) -> Result<DriftDecision> {
        if reference.is_empty() || recent.is_empty() {
            return Ok(DriftDecision::no_data());
        }
        let score = self.scorer.score(reference, recent)?;
        Ok(self.decide(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::PopulationLabel;
    use crate::vector::EmbeddingVector;

    #[test]
    fn test_policies_compare_by_threshold() {
        assert_eq!(DriftPolicy::new(0.1).unwrap(), DriftPolicy::new(0.1).unwrap());
        assert_ne!(DriftPolicy::new(0.1).unwrap(), DriftPolicy::new(0.2).unwrap());
    }

    #[test]
    fn test_strict_boundary() {
        let s = DriftScore::new(0.1);
        assert!(!decide(s, 0.1).is_drift);
        assert!(decide(s, 0.0999).is_drift);
        assert!(!decide(s, 0.1001).is_drift);
    }

    #[test]
    fn test_decide_matches_comparison() {
        let values = [0.0, 0.05, 0.1, 0.5, 1.0, 1.5, 2.0];
        for &s in &values {
            for &t in &values {
                assert_eq!(decide(DriftScore::new(s), t).is_drift, s > t);
            }
        }
    }

    #[test]
    fn test_zero_score_never_drifts() {
        for t in [0.0, 0.1, 1.0, 2.0] {
            assert!(!decide(DriftScore::ZERO, t).is_drift);
        }
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(DriftPolicy::new(-0.1).is_err());
        assert!(DriftPolicy::new(f64::NAN).is_err());
        assert!(DriftPolicy::new(f64::INFINITY).is_err());
        assert!(DriftPolicy::new(0.0).is_ok());
    }

    #[test]
    fn test_evaluate_empty_short_circuits() {
        let policy = DriftPolicy::new(0.1).unwrap();
        // Different dimensions would make the scorer fail; the empty side must
        // short-circuit first.
        let reference = VectorPopulation::new(
            PopulationLabel::Reference,
            vec![EmbeddingVector::new(vec![1.0, 0.0])],
        )
        .unwrap();
        let recent = VectorPopulation::empty(PopulationLabel::Recent);

        let decision = policy.evaluate(&reference, &recent).unwrap();
        assert_eq!(decision, DriftDecision::no_data());
        assert_eq!(decision.score.value(), 0.0);
    }

    #[test]
    fn test_evaluate_detects_shift() {
        let policy = DriftPolicy::new(0.1).unwrap();
        let reference = VectorPopulation::new(
            PopulationLabel::Reference,
            vec![EmbeddingVector::new(vec![1.0, 0.0])],
        )
        .unwrap();
        let recent = VectorPopulation::new(
            PopulationLabel::Recent,
            vec![EmbeddingVector::new(vec![0.0, 1.0])],
        )
        .unwrap();
        let decision = policy.evaluate(&reference, &recent).unwrap();
        assert!(decision.is_drift);
    }
}

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A dense embedding vector in double precision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EmbeddingVector {
    data: Vec<f64>,
}

impl EmbeddingVector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f64]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn dot(&self, other: &EmbeddingVector) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Largest absolute component, 0.0 for an empty vector
    #[inline]
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, x| m.max(x.abs()))
    }

    /// Compute cosine similarity with another vector.
    /// A zero-norm operand has no direction and yields 0.0.
    ///
    /// Both operands are rescaled by their largest component first, so the
    /// dot product and norms stay finite for any finite input.
    #[inline]
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f64 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let scale_a = self.max_abs();
        let scale_b = other.max_abs();

        if scale_a == 0.0 || scale_b == 0.0 {
            return 0.0;
        }

        let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            let a = a / scale_a;
            let b = b / scale_b;
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        dot / (norm_a.sqrt() * norm_b.sqrt())
    }

    /// `1 - cosine_similarity`, clamped to `[0, 2]`
    #[inline]
    pub fn cosine_distance(&self, other: &EmbeddingVector) -> f64 {
        if self == other {
            return 0.0;
        }
        (1.0 - self.cosine_similarity(other)).clamp(0.0, 2.0)
    }
}

impl From<Vec<f64>> for EmbeddingVector {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

/// An embedding as it comes back from a store, before normalization.
///
/// REST backends often hand vector columns back as their text encoding
/// (`"[0.1,0.2,...]"`), while local stores keep the numeric sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawEmbedding {
    Structured(Vec<f64>),
    Encoded(String),
}

impl TryFrom<RawEmbedding> for EmbeddingVector {
    type Error = Error;

    fn try_from(raw: RawEmbedding) -> Result<Self> {
        let data = match raw {
            RawEmbedding::Structured(data) => data,
            RawEmbedding::Encoded(text) => serde_json::from_str::<Vec<f64>>(text.trim())
                .map_err(|e| Error::MalformedEmbedding(format!("{}: {}", preview(&text), e)))?,
        };

        if let Some(pos) = data.iter().position(|x| !x.is_finite()) {
            return Err(Error::MalformedEmbedding(format!(
                "non-finite component at index {}",
                pos
            )));
        }

        Ok(Self::new(data))
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 32;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

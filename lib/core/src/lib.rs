//! # driftwatch Core
//!
//! Core library for the driftwatch embedding drift monitor.
//!
//! This crate provides the data model and the pure decision logic:
//!
//! - [`EmbeddingVector`] - Dense `f64` vector, plus [`RawEmbedding`] normalization
//! - [`VectorPopulation`] - Labelled, equally sized set of vectors with centroid and merge
//! - [`DriftScorer`] - Cosine distance between population centroids
//! - [`DriftPolicy`] - Strict threshold decision
//! - [`DriftEvent`] - Append-only audit record
//! - [`ModelTrainer`] - The model-fitting capability used on drift
//!
//! ## Example
//!
//! ```rust
//! use driftwatch_core::{DriftPolicy, EmbeddingVector, PopulationLabel, VectorPopulation};
//!
//! let reference = VectorPopulation::new(
//!     PopulationLabel::Reference,
//!     vec![EmbeddingVector::new(vec![1.0, 0.0])],
//! ).unwrap();
//! let recent = VectorPopulation::new(
//!     PopulationLabel::Recent,
//!     vec![EmbeddingVector::new(vec![0.0, 1.0])],
//! ).unwrap();
//!
//! let policy = DriftPolicy::new(0.1).unwrap();
//! let decision = policy.evaluate(&reference, &recent).unwrap();
//! assert!(decision.is_drift);
//! ```

pub mod error;
pub mod event;
pub mod policy;
pub mod population;
pub mod scorer;
pub mod training;
pub mod vector;

pub use error::{Error, Result};
pub use event::{DriftEvent, EventType};
pub use policy::{decide, DriftDecision, DriftPolicy};
pub use population::{PopulationLabel, VectorPopulation};
pub use scorer::{DriftScore, DriftScorer};
pub use training::{FnTrainer, ModelTrainer, RetrainingResult};
pub use vector::{EmbeddingVector, RawEmbedding};

//! # driftwatch Monitor
//!
//! The evaluation cycle and its collaborators:
//!
//! - [`MonitorConfig`] - Threshold, window and caps
//! - [`PopulationFetcher`] - Reference and recent populations from a [`VectorStore`](driftwatch_storage::VectorStore)
//! - [`RetrainingOrchestrator`] - Merge and hand off to a [`ModelTrainer`](driftwatch_core::ModelTrainer)
//! - [`EventRecorder`] - Audit writes that never fail the cycle
//! - [`DriftMonitor`] - One cycle end to end
//! - [`CentroidProfileTrainer`] - Default trainer writing versioned model artifacts
//! - [`seed`] - Synthetic data for trying the pipeline out

pub mod config;
pub mod cycle;
pub mod fetcher;
pub mod orchestrator;
pub mod recorder;
pub mod seeder;
pub mod trainer;

pub use config::MonitorConfig;
pub use cycle::{CycleReport, Disposition, DriftMonitor};
pub use fetcher::PopulationFetcher;
pub use orchestrator::{RetrainingOrchestrator, RetrainingOutcome};
pub use recorder::EventRecorder;
pub use seeder::{generate_embedding, seed, SeedPlan, SeedSummary};
pub use trainer::{CentroidProfile, CentroidProfileTrainer};

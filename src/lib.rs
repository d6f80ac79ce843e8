//! # driftwatch
//!
//! Embedding drift monitor.
//!
//! driftwatch compares the embeddings your system produced recently with an
//! older reference set. When the cosine distance between the two centroids
//! rises above a threshold it retrains a model on everything it fetched and
//! writes an audit event.
//!
//! ## Quick Start
//!
//! ### As a Batch Job
//!
//! ```bash
//! cargo install driftwatch
//! driftwatch seed --data-dir ./data      # synthetic data, optional
//! driftwatch run --data-dir ./data --threshold 0.1
//! ```
//!
//! Every flag can also come from the environment (`DRIFTWATCH_THRESHOLD`,
//! `DRIFTWATCH_BACKEND`, `SUPABASE_URL`, ...), so a cron entry or container
//! scheduler can run `driftwatch` with no arguments.
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use driftwatch::prelude::*;
//!
//! let store = MemoryStore::new();
//! let trainer = CentroidProfileTrainer::new("./models");
//! let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
//!
//! let report = monitor.run_cycle().unwrap();
//! println!("score {} -> {}", report.decision.score, report.disposition);
//! ```
//!
//! ## Crate Structure
//!
//! - [`driftwatch-core`](https://docs.rs/driftwatch-core) - Vectors, populations, scorer, policy, events
//! - [`driftwatch-storage`](https://docs.rs/driftwatch-storage) - Vector stores and event logs (memory, LMDB, JSON lines, PostgREST)
//! - [`driftwatch-monitor`](https://docs.rs/driftwatch-monitor) - The evaluation cycle, default trainer, seeder
//!
//! ## Features
//!
//! - **Centroid Drift**: `1 - cos(mean(reference), mean(recent))`, strict threshold
//! - **Fail-Open Fetching**: an unreachable store reads as "no data", never as drift
//! - **Retraining**: pluggable [`ModelTrainer`], versioned artifacts with SHA-256 checksums
//! - **Audit Trail**: append-only drift events, failures reported but never fatal

// Re-export core types
pub use driftwatch_core::{
    decide, DriftDecision, DriftEvent, DriftPolicy, DriftScore, DriftScorer, EmbeddingVector, Error, EventType,
    FnTrainer, ModelTrainer, PopulationLabel, RawEmbedding, Result, RetrainingResult, VectorPopulation,
};

// Re-export storage
pub use driftwatch_storage::{
    EmbeddingRecord, EventFile, EventLog, LmdbStorage, MemoryStore, RestConfig, RestStore, StoredEmbedding,
    TimePredicate, VectorStore,
};

// Re-export the monitor
pub use driftwatch_monitor::{
    seed, CentroidProfile, CentroidProfileTrainer, CycleReport, Disposition, DriftMonitor, MonitorConfig,
    SeedPlan, SeedSummary,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CentroidProfileTrainer, CycleReport, Disposition, DriftDecision, DriftEvent, DriftMonitor, DriftPolicy,
        EmbeddingRecord, EmbeddingVector, Error, EventLog, EventType, LmdbStorage, MemoryStore, ModelTrainer,
        MonitorConfig, Result, TimePredicate, VectorPopulation, VectorStore,
    };
}

// Integration tests for driftwatch
use chrono::{DateTime, Duration, Utc};
use driftwatch::{
    seed, CentroidProfile, CentroidProfileTrainer, Disposition, DriftEvent, DriftMonitor, EmbeddingRecord, Error,
    EventFile, EventLog, EventType, FnTrainer, LmdbStorage, MemoryStore, MonitorConfig, RawEmbedding, Result,
    RetrainingResult, SeedPlan, StoredEmbedding, TimePredicate, VectorPopulation, VectorStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;

fn record(timestamp: DateTime<Utc>, embedding: Vec<f64>) -> EmbeddingRecord {
    EmbeddingRecord {
        content: "user question".to_string(),
        kind: "query".to_string(),
        timestamp,
        embedding,
    }
}

/// `reference` rows dated ten days ago, `recent` rows dated one day ago
fn store_with(now: DateTime<Utc>, reference: Vec<Vec<f64>>, recent: Vec<Vec<f64>>) -> MemoryStore {
    let old = now - Duration::days(10);
    let fresh = now - Duration::days(1);
    let mut records: Vec<EmbeddingRecord> = reference.into_iter().map(|e| record(old, e)).collect();
    records.extend(recent.into_iter().map(|e| record(fresh, e)));
    MemoryStore::with_records(records)
}

fn cluster(direction: [f64; 3], n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            let jitter = 0.01 * (i % 5) as f64;
            vec![direction[0] + jitter, direction[1], direction[2] + jitter]
        })
        .collect()
}

/// Store whose reference (`Before`) query always fails
struct FlakyReferenceStore(MemoryStore);

impl VectorStore for FlakyReferenceStore {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        match predicate {
            TimePredicate::Before(_) => Err(Error::Storage("connection refused".to_string())),
            TimePredicate::After(_) => self.0.fetch(predicate, limit),
        }
    }

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        self.0.insert(records)
    }
}

struct BrokenEventLog;

impl EventLog for BrokenEventLog {
    fn append(&self, _: &DriftEvent) -> Result<()> {
        Err(Error::Storage("events table missing".to_string()))
    }
}

#[test]
fn test_drift_triggers_retraining_and_event() {
    let now = Utc::now();
    let models = tempfile::tempdir().unwrap();
    let store = store_with(now, cluster([1.0, 0.0, 0.0], 20), cluster([0.0, 1.0, 0.0], 10));
    let trainer = CentroidProfileTrainer::new(models.path()).with_seed(7);

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert!(report.decision.is_drift);
    assert!(report.decision.score.value() > 0.1);
    assert_eq!(report.reference_count, 20);
    assert_eq!(report.recent_count, 10);

    let artifact = match &report.disposition {
        Disposition::Retrained { artifact, .. } => artifact.clone(),
        other => panic!("expected retraining, got {:?}", other),
    };
    let profile = CentroidProfile::load(&artifact).unwrap();
    assert_eq!(profile.training_size + profile.holdout_size, 30);
    assert_eq!(profile.dim, 3);

    let events = monitor.events().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::ModelRetraining);
    assert_eq!(events[0].severity_score, report.decision.score.value());
    assert!(events[0].action_taken.contains(&artifact));
    assert!(report.event_recorded);
}

#[test]
fn test_similar_populations_are_stable() {
    let now = Utc::now();
    let called = Cell::new(false);
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        called.set(true);
        Err(Error::Training("must not run".to_string()))
    });
    let store = store_with(now, cluster([1.0, 0.2, 0.0], 30), cluster([1.0, 0.25, 0.0], 10));

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert!(!report.decision.is_drift);
    assert!(report.decision.score.value() < 0.1);
    assert_eq!(report.disposition, Disposition::Stable);
    assert!(!called.get());
    assert!(monitor.events().events().is_empty());
}

#[test]
fn test_empty_recent_window_scores_zero() {
    let now = Utc::now();
    let called = Cell::new(false);
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        called.set(true);
        Err(Error::Training("must not run".to_string()))
    });
    let store = store_with(now, cluster([1.0, 0.0, 0.0], 30), Vec::new());

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert_eq!(report.decision.score.value(), 0.0);
    assert!(!report.decision.is_drift);
    assert_eq!(report.disposition, Disposition::NoData);
    assert_eq!(report.recent_count, 0);
    assert!(!called.get());
    assert!(monitor.events().events().is_empty());
}

#[test]
fn test_unreachable_reference_store_completes_cycle() {
    let now = Utc::now();
    let inner = store_with(now, cluster([1.0, 0.0, 0.0], 30), cluster([0.0, 1.0, 0.0], 10));
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        Err(Error::Training("must not run".to_string()))
    });

    let monitor =
        DriftMonitor::new(MonitorConfig::default(), FlakyReferenceStore(inner), MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert_eq!(report.reference_count, 0);
    assert_eq!(report.recent_count, 10);
    assert_eq!(report.decision.score.value(), 0.0);
    assert_eq!(report.disposition, Disposition::NoData);
    assert!(monitor.events().events().is_empty());
}

#[test]
fn test_trainer_failure_records_retraining_failed() {
    let now = Utc::now();
    let store = store_with(now, cluster([1.0, 0.0, 0.0], 5), cluster([0.0, 0.0, 1.0], 5));
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        Err(Error::Training("solver diverged".to_string()))
    });

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert!(report.decision.is_drift);
    assert!(matches!(&report.disposition, Disposition::RetrainingFailed { reason } if reason.contains("solver diverged")));
    let events = monitor.events().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::RetrainingFailed);
}

#[test]
fn test_event_log_failure_does_not_fail_cycle() {
    let now = Utc::now();
    let store = store_with(now, cluster([1.0, 0.0, 0.0], 5), cluster([0.0, 1.0, 0.0], 5));
    let trainer = FnTrainer(|p: &VectorPopulation| -> Result<RetrainingResult> {
        Ok(RetrainingResult {
            artifact: format!("models/model_{}.json", p.len()),
            accuracy: 0.8,
        })
    });

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, BrokenEventLog, trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert!(matches!(report.disposition, Disposition::Retrained { .. }));
    assert!(!report.event_recorded);
}

#[test]
fn test_configured_dimension_mismatch_aborts() {
    let now = Utc::now();
    let store = store_with(now, cluster([1.0, 0.0, 0.0], 5), cluster([0.0, 1.0, 0.0], 5));
    let config = MonitorConfig {
        vector_dim: Some(1536),
        ..Default::default()
    };
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        Err(Error::Training("must not run".to_string()))
    });

    let monitor = DriftMonitor::new(config, store, MemoryStore::new(), trainer).unwrap();
    let err = monitor.run_cycle_at(now).unwrap_err();
    assert!(matches!(err, Error::InvalidDimension { expected: 1536, actual: 3 }));
    assert!(monitor.events().events().is_empty());
}

/// Rows in the text encoding a pgvector column produces over REST
struct EncodedStore {
    now: DateTime<Utc>,
    reference: &'static str,
    recent: &'static str,
}

impl VectorStore for EncodedStore {
    fn fetch(&self, predicate: TimePredicate, _limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        let (text, timestamp) = match predicate {
            TimePredicate::Before(_) => (self.reference, self.now - Duration::days(10)),
            TimePredicate::After(_) => (self.recent, self.now),
        };
        Ok(vec![StoredEmbedding {
            embedding: RawEmbedding::Encoded(text.to_string()),
            timestamp,
        }])
    }

    fn insert(&self, _: &[EmbeddingRecord]) -> Result<usize> {
        Ok(0)
    }
}

#[test]
fn test_encoded_embeddings_are_normalized() {
    let now = Utc::now();
    let store = EncodedStore {
        now,
        reference: "[1.0, 0.0]",
        recent: "[2.0, 0.0]",
    };
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        Err(Error::Training("must not run".to_string()))
    });

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();
    assert_eq!(report.disposition, Disposition::Stable);
    assert!(report.decision.score.value() < 1e-12);
}

#[test]
fn test_malformed_embedding_aborts() {
    let now = Utc::now();
    let store = EncodedStore {
        now,
        reference: "[1.0, 0.0]",
        recent: "not a vector",
    };
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        Err(Error::Training("must not run".to_string()))
    });

    let monitor = DriftMonitor::new(MonitorConfig::default(), store, MemoryStore::new(), trainer).unwrap();
    let err = monitor.run_cycle_at(now).unwrap_err();
    assert!(err.is_fatal_input());
}

#[test]
fn test_seeded_lmdb_store_drifts_end_to_end() {
    let data = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    let events_dir = tempfile::tempdir().unwrap();
    let now = Utc::now();

    let storage = LmdbStorage::new(data.path()).unwrap();
    let plan = SeedPlan {
        dim: 64,
        ..Default::default()
    };
    let summary = seed(&storage, &plan, now - Duration::seconds(1), &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(summary.reference, 50);
    assert_eq!(summary.recent, 20);
    assert_eq!(storage.count().unwrap(), 70);

    let events = EventFile::open(events_dir.path().join("drift_events.jsonl")).unwrap();
    let trainer = CentroidProfileTrainer::new(models.path()).with_seed(3);
    let config = MonitorConfig {
        vector_dim: Some(64),
        ..Default::default()
    };

    let monitor = DriftMonitor::new(config, storage, events, trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();

    assert_eq!(report.reference_count, 50);
    assert_eq!(report.recent_count, 20);
    assert!(report.decision.is_drift, "score {}", report.decision.score);
    assert!(matches!(report.disposition, Disposition::Retrained { .. }));

    let recorded = monitor.events().read_all().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].event_type, EventType::ModelRetraining);
    assert!(monitor.store().list_events().unwrap().is_empty());
}

#[test]
fn test_reference_limit_keeps_newest_rows() {
    let now = Utc::now();
    // oldest reference rows point elsewhere; only the newest two survive the cap
    let records = vec![
        record(now - Duration::days(30), vec![0.0, 1.0]),
        record(now - Duration::days(29), vec![0.0, 1.0]),
        record(now - Duration::days(9), vec![1.0, 0.0]),
        record(now - Duration::days(8), vec![1.0, 0.0]),
        record(now - Duration::days(1), vec![1.0, 0.0]),
    ];
    let config = MonitorConfig {
        reference_limit: Some(2),
        ..Default::default()
    };
    let trainer = FnTrainer(|_: &VectorPopulation| -> Result<RetrainingResult> {
        Err(Error::Training("must not run".to_string()))
    });

    let monitor = DriftMonitor::new(config, MemoryStore::with_records(records), MemoryStore::new(), trainer).unwrap();
    let report = monitor.run_cycle_at(now).unwrap();
    assert_eq!(report.reference_count, 2);
    assert_eq!(report.decision.score.value(), 0.0);
    assert_eq!(report.disposition, Disposition::Stable);
}

use driftwatch_core::{DriftEvent, Result};
use parking_lot::RwLock;

use crate::store::{apply_limit, EmbeddingRecord, EventLog, StoredEmbedding, TimePredicate, VectorStore};

/// In-process store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<EmbeddingRecord>>,
    events: RwLock<Vec<DriftEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<EmbeddingRecord>) -> Self {
        let store = Self::new();
        *store.records.write() = records;
        store
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<DriftEvent> {
        self.events.read().clone()
    }
}

impl VectorStore for MemoryStore {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        let records = self.records.read();
        let mut matched: Vec<&EmbeddingRecord> = records
            .iter()
            .filter(|r| predicate.matches(&r.timestamp))
            .collect();
        // stable sort keeps insertion order among equal timestamps
        matched.sort_by_key(|r| r.timestamp);

        let rows = matched.into_iter().map(StoredEmbedding::from).collect();
        Ok(apply_limit(rows, predicate, limit))
    }

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        self.records.write().extend_from_slice(records);
        Ok(records.len())
    }
}

impl EventLog for MemoryStore {
    fn append(&self, event: &DriftEvent) -> Result<()> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

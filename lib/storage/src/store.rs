//! Storage seams consumed by the monitor
//!
//! Two logical tables sit behind these traits: an `embeddings_log` of
//! `{embedding, timestamp}` rows read by time range, and a `drift_events`
//! audit table that only ever grows.

use chrono::{DateTime, Utc};
use driftwatch_core::{DriftEvent, RawEmbedding, Result};
use serde::{Deserialize, Serialize};

/// Time bound for a population query. Both bounds are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePredicate {
    /// timestamp > bound
    After(DateTime<Utc>),
    /// timestamp < bound
    Before(DateTime<Utc>),
}

impl TimePredicate {
    #[inline]
    pub fn matches(&self, timestamp: &DateTime<Utc>) -> bool {
        match self {
            TimePredicate::After(bound) => timestamp > bound,
            TimePredicate::Before(bound) => timestamp < bound,
        }
    }
}

/// A row of the embeddings log as written by producers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub embedding: Vec<f64>,
}

/// The projection the monitor reads back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub embedding: RawEmbedding,
    pub timestamp: DateTime<Utc>,
}

impl From<&EmbeddingRecord> for StoredEmbedding {
    fn from(record: &EmbeddingRecord) -> Self {
        Self {
            embedding: RawEmbedding::Structured(record.embedding.clone()),
            timestamp: record.timestamp,
        }
    }
}

/// Time-ranged embedding storage.
///
/// `fetch` returns rows in ascending timestamp order. When `limit` caps a
/// [`TimePredicate::Before`] query, the newest matching rows are kept; for
/// [`TimePredicate::After`] the oldest are kept.
pub trait VectorStore {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>>;

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize>;
}

/// Append-only sink for drift events
pub trait EventLog {
    fn append(&self, event: &DriftEvent) -> Result<()>;
}

impl<T: VectorStore + ?Sized> VectorStore for Box<T> {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        (**self).fetch(predicate, limit)
    }

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        (**self).insert(records)
    }
}

impl<T: EventLog + ?Sized> EventLog for Box<T> {
    fn append(&self, event: &DriftEvent) -> Result<()> {
        (**self).append(event)
    }
}

impl<T: VectorStore + ?Sized> VectorStore for std::sync::Arc<T> {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        (**self).fetch(predicate, limit)
    }

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        (**self).insert(records)
    }
}

impl<T: EventLog + ?Sized> EventLog for std::sync::Arc<T> {
    fn append(&self, event: &DriftEvent) -> Result<()> {
        (**self).append(event)
    }
}

/// Apply the limit semantics of [`VectorStore::fetch`] to an
/// ascending-ordered result set.
pub(crate) fn apply_limit<T>(mut rows: Vec<T>, predicate: TimePredicate, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        if rows.len() > limit {
            match predicate {
                TimePredicate::Before(_) => {
                    rows.drain(..rows.len() - limit);
                }
                TimePredicate::After(_) => rows.truncate(limit),
            }
        }
    }
    rows
}

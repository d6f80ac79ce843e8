// LMDB-backed embeddings log and event log
use chrono::{DateTime, Utc};
use driftwatch_core::{DriftEvent, Error, Result};
use heed::byteorder::BE;
use heed::types::{Bytes, U128};
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use crate::store::{EmbeddingRecord, EventLog, StoredEmbedding, TimePredicate, VectorStore};

const DB_EMBEDDINGS: &str = "embeddings";
const DB_EVENTS: &str = "events";

/// Keys are `time_key(timestamp) << 64 | sequence`, so a time predicate maps
/// to one contiguous key range and rows sharing a timestamp stay distinct.
type TimeKeyed = Database<U128<BE>, Bytes>;

pub struct LmdbStorage {
    env: Arc<Env>,
    embeddings_db: TimeKeyed,
    events_db: TimeKeyed,
}

fn storage_err(e: impl std::fmt::Display) -> Error {
    Error::Storage(e.to_string())
}

fn codec_err(e: impl std::fmt::Display) -> Error {
    Error::Serialization(e.to_string())
}

/// Order-preserving map from a timestamp to an unsigned key prefix
fn time_key(ts: &DateTime<Utc>) -> u64 {
    let nanos = ts.timestamp_nanos_opt().unwrap_or(if ts.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    });
    (nanos as u64) ^ (1 << 63)
}

#[inline]
fn first_key(ts: &DateTime<Utc>) -> u128 {
    (time_key(ts) as u128) << 64
}

#[inline]
fn last_key(ts: &DateTime<Utc>) -> u128 {
    first_key(ts) | u64::MAX as u128
}

impl LmdbStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(10 * 1024 * 1024 * 1024) // 10GB
                .max_dbs(4)
                .open(path)
                .map_err(storage_err)?
        });

        let mut wtxn = env.write_txn().map_err(storage_err)?;

        let embeddings_db = env
            .create_database(&mut wtxn, Some(DB_EMBEDDINGS))
            .map_err(storage_err)?;

        let events_db = env
            .create_database(&mut wtxn, Some(DB_EVENTS))
            .map_err(storage_err)?;

        wtxn.commit().map_err(storage_err)?;

        Ok(Self {
            env,
            embeddings_db,
            events_db,
        })
    }

    /// Number of stored embeddings
    pub fn count(&self) -> Result<u64> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        self.embeddings_db.len(&rtxn).map_err(storage_err)
    }

    /// All recorded events in timestamp order
    pub fn list_events(&self) -> Result<Vec<DriftEvent>> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        let mut events = Vec::new();
        for entry in self.events_db.iter(&rtxn).map_err(storage_err)? {
            let (_, data) = entry.map_err(storage_err)?;
            events.push(bincode::deserialize(data).map_err(codec_err)?);
        }
        Ok(events)
    }

    /// Next free key for a timestamp inside `db`
    fn next_key(db: &TimeKeyed, txn: &RoTxn, ts: &DateTime<Utc>) -> Result<u128> {
        let range = first_key(ts)..=last_key(ts);
        let last = db
            .rev_range(txn, &range)
            .map_err(storage_err)?
            .next()
            .transpose()
            .map_err(storage_err)?;
        match last {
            Some((key, _)) if key == last_key(ts) => Err(Error::Storage(format!(
                "too many rows share timestamp {}",
                ts
            ))),
            Some((key, _)) => Ok(key + 1),
            None => Ok(first_key(ts)),
        }
    }

    fn decode_embedding(data: &[u8]) -> Result<StoredEmbedding> {
        let record: EmbeddingRecord = bincode::deserialize(data).map_err(codec_err)?;
        Ok(StoredEmbedding::from(&record))
    }
}

impl VectorStore for LmdbStorage {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        let take = limit.unwrap_or(usize::MAX);
        let mut rows = Vec::new();

        match predicate {
            TimePredicate::After(bound) => {
                let range = (Bound::Excluded(last_key(&bound)), Bound::Unbounded);
                for entry in self.embeddings_db.range(&rtxn, &range).map_err(storage_err)?.take(take) {
                    let (_, data) = entry.map_err(storage_err)?;
                    rows.push(Self::decode_embedding(data)?);
                }
            }
            TimePredicate::Before(bound) => {
                // walk backwards from the boundary so the cap keeps the newest rows
                let range = ..first_key(&bound);
                for entry in self.embeddings_db.rev_range(&rtxn, &range).map_err(storage_err)?.take(take) {
                    let (_, data) = entry.map_err(storage_err)?;
                    rows.push(Self::decode_embedding(data)?);
                }
                rows.reverse();
            }
        }

        Ok(rows)
    }

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        let mut wtxn = self.env.write_txn().map_err(storage_err)?;
        for record in records {
            let key = Self::next_key(&self.embeddings_db, &wtxn, &record.timestamp)?;
            let data = bincode::serialize(record).map_err(codec_err)?;
            self.embeddings_db
                .put(&mut wtxn, &key, &data)
                .map_err(storage_err)?;
        }
        wtxn.commit().map_err(storage_err)?;
        Ok(records.len())
    }
}

impl EventLog for LmdbStorage {
    fn append(&self, event: &DriftEvent) -> Result<()> {
        let mut wtxn = self.env.write_txn().map_err(storage_err)?;
        let key = Self::next_key(&self.events_db, &wtxn, &event.timestamp)?;
        let data = bincode::serialize(event).map_err(codec_err)?;
        self.events_db
            .put(&mut wtxn, &key, &data)
            .map_err(storage_err)?;
        wtxn.commit().map_err(storage_err)?;
        Ok(())
    }
}

//! PostgREST (Supabase) backend
//!
//! Reads the embeddings table with `gt.` / `lt.` timestamp filters and writes
//! rows with `POST`. Vector columns come back in their text encoding, which
//! [`RawEmbedding::Encoded`] carries through to the fetcher untouched.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use driftwatch_core::{DriftEvent, Error, RawEmbedding, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::store::{EmbeddingRecord, EventLog, StoredEmbedding, TimePredicate, VectorStore};

pub const DEFAULT_EMBEDDINGS_TABLE: &str = "embeddings_log";
pub const DEFAULT_EVENTS_TABLE: &str = "drift_events";

#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub api_key: String,
    pub embeddings_table: String,
    pub events_table: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            embeddings_table: DEFAULT_EMBEDDINGS_TABLE.to_string(),
            events_table: DEFAULT_EVENTS_TABLE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Row shape returned by `select=embedding,timestamp`
#[derive(Deserialize)]
struct RestRow {
    embedding: RawEmbedding,
    timestamp: String,
}

/// Row shape written to the events table
#[derive(Serialize)]
struct EventRow<'a> {
    event_type: &'a str,
    severity_score: f64,
    details: &'a str,
    action_taken: &'a str,
    timestamp: String,
}

pub struct RestStore {
    config: RestConfig,
    client: reqwest::blocking::Client,
}

impl RestStore {
    pub fn new(config: RestConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::InvalidConfig("REST store URL is empty".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("REST store API key is empty".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("driftwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Storage(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn post_json<T: Serialize + ?Sized>(&self, table: &str, body: &T) -> Result<()> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .map_err(|e| Error::Storage(format!("POST {table} failed: {e}")))?;

        check_status(response).map(|_| ())
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        Err(Error::Storage(format!("HTTP {status}: {body}")))
    }
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// PostgREST query parameters for one population fetch
pub(crate) fn fetch_query(predicate: TimePredicate, limit: Option<usize>) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "embedding,timestamp".to_string())];
    match predicate {
        TimePredicate::After(bound) => {
            query.push(("timestamp", format!("gt.{}", iso(&bound))));
            query.push(("order", "timestamp.asc".to_string()));
        }
        TimePredicate::Before(bound) => {
            query.push(("timestamp", format!("lt.{}", iso(&bound))));
            // newest first so `limit` keeps the rows nearest the window
            query.push(("order", "timestamp.desc".to_string()));
        }
    }
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

/// Accept both `timestamptz` output and naive `timestamp` columns (read as UTC)
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

impl VectorStore for RestStore {
    fn fetch(&self, predicate: TimePredicate, limit: Option<usize>) -> Result<Vec<StoredEmbedding>> {
        let table = &self.config.embeddings_table;
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .query(&fetch_query(predicate, limit))
            .send()
            .map_err(|e| Error::Storage(format!("GET {table} failed: {e}")))?;

        let rows: Vec<RestRow> = check_status(response)?
            .json()
            .map_err(|e| Error::Serialization(format!("GET {table}: {e}")))?;

        let mut out = rows
            .into_iter()
            .map(|row| {
                Ok(StoredEmbedding {
                    embedding: row.embedding,
                    timestamp: parse_timestamp(&row.timestamp)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if matches!(predicate, TimePredicate::Before(_)) {
            out.reverse();
        }
        Ok(out)
    }

    fn insert(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.post_json(&self.config.embeddings_table, records)?;
        Ok(records.len())
    }
}

impl EventLog for RestStore {
    fn append(&self, event: &DriftEvent) -> Result<()> {
        let row = EventRow {
            event_type: event.event_type.as_str(),
            severity_score: event.severity_score,
            details: &event.details,
            action_taken: &event.action_taken,
            timestamp: iso(&event.timestamp),
        };
        self.post_json(&self.config.events_table, &row)
    }
}

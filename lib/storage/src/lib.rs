pub mod event_file;
pub mod lmdb_storage;
pub mod memory;
pub mod rest;
pub mod store;

pub use event_file::EventFile;
pub use lmdb_storage::LmdbStorage;
pub use memory::MemoryStore;
pub use rest::{RestConfig, RestStore};
pub use store::{EmbeddingRecord, EventLog, StoredEmbedding, TimePredicate, VectorStore};

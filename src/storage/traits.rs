//! Storage trait definitions

use crate::group::ConceptGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The durable canonical label of one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflabelRecord {
    pub key: String,
    pub preflabel: String,
    /// Running count of labels across every batch that touched the key
    pub total: u64,
    pub created_at: DateTime<Utc>,
}

/// Durable key → canonical label table.
///
/// Implementations must be thread-safe and must serialize upserts per key:
/// two batches touching the same key may not lose an increment.
pub trait PreflabelStore: Send + Sync {
    /// Canonical label for a key, if one has been established
    fn lookup(&self, key: &str) -> StorageResult<Option<String>>;

    /// Reconcile a batch group with history and return the canonical label.
    ///
    /// A new key is stored with the group's preferred label and total. A known
    /// key keeps its stored label and has the group's total added to it.
    fn upsert(&self, group: &ConceptGroup) -> StorageResult<String>;

    /// Full record for a key
    fn record(&self, key: &str) -> StorageResult<Option<PreflabelRecord>>;

    /// Number of stored keys
    fn count(&self) -> StorageResult<usize>;

    /// Remove every record. Administrative use only.
    fn reset(&self) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: PreflabelStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

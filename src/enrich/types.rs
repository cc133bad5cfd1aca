//! Enrichment configuration and batch results

use crate::chunk::{ChunkerConfig, Label, TagSet};
use crate::group::ConceptGroup;
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload field receiving the document's concept labels grouped by key
pub const CONCEPTS_FIELD: &str = "concepts_by_key";
/// Payload field receiving the document's predicate labels grouped by key
pub const PREDICATES_FIELD: &str = "predicates_by_key";

/// Batch-level failures. Any of these aborts the batch.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("preflabel store error: {0}")]
    Storage(#[from] StorageError),

    #[error("chunking worker failed: {0}")]
    Chunking(String),
}

pub type EnrichResult<T> = Result<T, EnrichError>;

/// Knobs for one enrichment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Payload field holding the document identifier
    pub id_field: String,
    pub max_slop: usize,
    pub min_concept_length: usize,
    pub max_concept_length: usize,
    pub min_predicate_length: usize,
    pub max_predicate_length: usize,
    /// Keys with fewer labels than this in a batch are not grouped
    pub min_labels: usize,
    pub tags: TagSet,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            max_slop: 4,
            min_concept_length: 2,
            max_concept_length: 4,
            min_predicate_length: 2,
            max_predicate_length: 4,
            min_labels: 2,
            tags: TagSet::default(),
        }
    }
}

impl EnrichConfig {
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            max_slop: self.max_slop,
            max_concept_length: self.max_concept_length,
            max_predicate_length: self.max_predicate_length,
        }
    }
}

/// A document that could not be enriched. The rest of the batch continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    /// Position of the document in the submitted batch
    pub index: usize,
    pub docid: Option<String>,
    pub reason: String,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.docid {
            Some(id) => write!(f, "document {} ({}): {}", self.index, id, self.reason),
            None => write!(f, "document {}: {}", self.index, self.reason),
        }
    }
}

/// Counters for spans and groups dropped on purpose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    /// Concept spans shorter than `min_concept_length`
    pub short_concepts: usize,
    /// Predicate spans shorter than `min_predicate_length`
    pub short_predicates: usize,
    /// Concept keys below `min_labels`
    pub concept_groups: usize,
    /// Predicate keys below `min_labels`
    pub predicate_groups: usize,
}

/// Spans extracted from one document, before grouping.
#[derive(Debug, Clone)]
pub struct DocumentChunks {
    pub index: usize,
    pub docid: String,
    pub payload: serde_json::Value,
    pub concepts: Vec<Label>,
    pub predicates: Vec<Label>,
    pub short_concepts: usize,
    pub short_predicates: usize,
}

/// Everything one enrichment batch produced.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentBatch {
    /// Source payloads with the injected per-key label fields
    pub documents: Vec<serde_json::Value>,
    /// Canonicalized concept groups, by descending total
    pub concept_groups: Vec<ConceptGroup>,
    /// Canonicalized predicate groups, by descending total
    pub predicate_groups: Vec<ConceptGroup>,
    pub errors: Vec<DocumentError>,
    pub dropped: DropStats,
}

impl EnrichmentBatch {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

//! The Engine trait: one capability set, one implementation per backend

use super::filter::Filter;
use crate::config::EngineKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from talking to an indexing backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// One aggregation bucket, normalized across backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

impl TermCount {
    pub fn new(term: impl Into<String>, count: u64) -> Self {
        Self {
            term: term.into(),
            count,
        }
    }
}

/// One typeahead suggestion, normalized across backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub term: String,
    pub weight: u64,
}

/// Suggestion dictionaries every backend provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dictionary {
    /// Concept surface labels
    Concepts,
    /// Predicate surface labels
    Predicates,
}

/// A terms aggregation over one field.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub field: String,
    pub filter: Filter,
    pub min_count: u64,
    pub limit: usize,
}

impl AggregateRequest {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            filter: Filter::All,
            min_count: 1,
            limit: 100,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn min_count(mut self, min_count: u64) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Backend-specific index definition.
///
/// Solr cores are created from an instance directory holding their
/// configuration; Elasticsearch indexes from a settings/mappings body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSchema {
    pub instance_dir: Option<PathBuf>,
    pub body: Option<serde_json::Value>,
}

impl IndexSchema {
    /// Schema for the content index: no graph mapping, fields are mapped as
    /// they arrive.
    pub fn content() -> Self {
        Self {
            instance_dir: None,
            body: Some(serde_json::json!({})),
        }
    }

    pub fn with_instance_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.instance_dir = Some(dir.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A pass-through query for a named request handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuery {
    pub params: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RawQuery {
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first parameter with this key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.into(),
            None => self.params.push((key.to_string(), value.into())),
        }
    }
}

/// A document the backend refused during a bulk call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRejection {
    pub id: Option<String>,
    pub reason: String,
}

/// Outcome of one bulk call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub indexed: usize,
    pub rejected: Vec<BulkRejection>,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Render a scalar JSON value (string, number or bool) as text
pub(crate) fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split documents into those carrying a scalar `id` and rejections for the rest.
pub(crate) fn partition_by_id(documents: Vec<serde_json::Value>) -> (Vec<(String, serde_json::Value)>, Vec<BulkRejection>) {
    let mut accepted = Vec::with_capacity(documents.len());
    let mut rejected = Vec::new();
    for doc in documents {
        match doc.get("id").and_then(scalar_text) {
            Some(id) => accepted.push((id, doc)),
            None => rejected.push(BulkRejection {
                id: None,
                reason: "document has no 'id' field".to_string(),
            }),
        }
    }
    (accepted, rejected)
}

/// Index administration, content updates and normalized queries against one
/// index of one backend.
///
/// Aggregations and suggestions are expressed in each backend's native query
/// language but always come back as [`TermCount`] / [`Suggestion`].
#[async_trait]
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Name of the index this engine targets
    fn index_name(&self) -> &str;

    /// Names of all indexes on the host
    async fn indexes(&self) -> BackendResult<Vec<String>>;

    async fn index_exists(&self, name: &str) -> BackendResult<bool>;

    /// Create this engine's index
    async fn index_create(&self, schema: &IndexSchema) -> BackendResult<()>;

    /// Delete this engine's index. Deleting a missing index is not an error.
    async fn index_delete(&self) -> BackendResult<()>;

    /// Add or overwrite documents by their `id` field.
    ///
    /// Documents without an id are rejected individually; the call only fails
    /// as a whole on transport or status errors.
    async fn bulk_index(&self, documents: Vec<serde_json::Value>, timeout: Duration) -> BackendResult<BulkReport>;

    /// Run a native query against a request handler and return the raw response
    async fn raw_query(&self, query: &RawQuery, handler: &str) -> BackendResult<serde_json::Value>;

    async fn aggregate(&self, request: &AggregateRequest) -> BackendResult<Vec<TermCount>>;

    async fn suggest(&self, prefix: &str, dictionary: Dictionary, count: usize) -> BackendResult<Vec<Suggestion>>;
}

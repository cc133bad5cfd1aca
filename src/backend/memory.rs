//! In-process engine over a document map
//!
//! Evaluates [`Filter`]s directly against stored JSON documents. Used for
//! tests and for exploring small batches without a running backend.

use super::document::fields;
use super::engine::{
    partition_by_id, scalar_text, AggregateRequest, BackendError, BackendResult, BulkReport, Dictionary, Engine, IndexSchema,
    RawQuery, Suggestion, TermCount,
};
use super::filter::Filter;
use crate::config::EngineKind;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct IndexState {
    created: bool,
    documents: BTreeMap<String, Value>,
}

pub struct MemoryEngine {
    index: String,
    kind: EngineKind,
    state: Mutex<IndexState>,
}

impl MemoryEngine {
    /// An engine whose index already exists
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            kind: EngineKind::Solr,
            state: Mutex::new(IndexState {
                created: true,
                documents: BTreeMap::new(),
            }),
        }
    }

    /// An engine whose index has not been created yet
    pub fn uncreated(index: impl Into<String>) -> Self {
        let engine = Self::new(index);
        engine.state.lock().unwrap().created = false;
        engine
    }

    /// Report a different backend kind
    pub fn reporting_as(mut self, kind: EngineKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted ids of stored documents
    pub fn ids(&self) -> Vec<String> {
        self.state.lock().unwrap().documents.keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().documents.get(id).cloned()
    }

    fn matching(&self, filter: &Filter) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .documents
            .values()
            .filter(|doc| matches(filter, doc))
            .cloned()
            .collect()
    }
}

fn field_values(doc: &Value, field: &str) -> Vec<String> {
    match doc.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(value) => scalar_text(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn contains_phrase(text: &str, phrase: &[String]) -> bool {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    !phrase.is_empty() && words.windows(phrase.len()).any(|window| window == phrase)
}

fn matches(filter: &Filter, doc: &Value) -> bool {
    match filter {
        Filter::All => true,
        Filter::Term { field, value } => field_values(doc, field).iter().any(|v| v == value),
        Filter::Terms { field, values } => field_values(doc, field).iter().any(|v| values.contains(v)),
        Filter::Mentions(phrase) => {
            let phrase: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
            [fields::PREFLABEL, fields::LABEL]
                .iter()
                .flat_map(|field| field_values(doc, field))
                .any(|text| contains_phrase(&text, &phrase))
        }
        Filter::AnyOf(parts) => parts.iter().any(|part| matches(part, doc)),
        Filter::AllOf(parts) => parts.iter().all(|part| matches(part, doc)),
        Filter::Not(inner) => !matches(inner, doc),
    }
}

/// Descending count, then ascending term
fn ranked(counts: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[async_trait]
impl Engine for MemoryEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn index_name(&self) -> &str {
        &self.index
    }

    async fn indexes(&self) -> BackendResult<Vec<String>> {
        let created = self.state.lock().unwrap().created;
        Ok(if created { vec![self.index.clone()] } else { Vec::new() })
    }

    async fn index_exists(&self, name: &str) -> BackendResult<bool> {
        Ok(name == self.index && self.state.lock().unwrap().created)
    }

    async fn index_create(&self, _schema: &IndexSchema) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.created {
            return Err(BackendError::Status {
                status: 400,
                body: format!("index '{}' already exists", self.index),
            });
        }
        state.created = true;
        Ok(())
    }

    async fn index_delete(&self) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.created = false;
        state.documents.clear();
        Ok(())
    }

    async fn bulk_index(&self, documents: Vec<Value>, _timeout: Duration) -> BackendResult<BulkReport> {
        let (accepted, rejected) = partition_by_id(documents);
        let mut state = self.state.lock().unwrap();
        if !state.created {
            return Err(BackendError::Status {
                status: 404,
                body: format!("index '{}' does not exist", self.index),
            });
        }
        let indexed = accepted.len();
        for (id, doc) in accepted {
            state.documents.insert(id, doc);
        }
        Ok(BulkReport { indexed, rejected })
    }

    /// Supports `q`: `*:*` (or absent) returns every document, anything else
    /// matches documents with a field containing the text.
    async fn raw_query(&self, query: &RawQuery, _handler: &str) -> BackendResult<Value> {
        let needle = query.get("q").filter(|q| *q != "*:*").map(str::to_lowercase);
        let docs: Vec<Value> = self
            .matching(&Filter::All)
            .into_iter()
            .filter(|doc| match &needle {
                None => true,
                Some(needle) => doc
                    .as_object()
                    .map(|map| {
                        map.values()
                            .filter_map(Value::as_str)
                            .any(|text| text.to_lowercase().contains(needle.as_str()))
                    })
                    .unwrap_or(false),
            })
            .collect();
        Ok(json!({"response": {"numFound": docs.len(), "docs": docs}}))
    }

    async fn aggregate(&self, request: &AggregateRequest) -> BackendResult<Vec<TermCount>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for doc in self.matching(&request.filter) {
            for value in field_values(&doc, &request.field) {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
        Ok(ranked(counts)
            .into_iter()
            .filter(|(_, count)| *count >= request.min_count)
            .take(request.limit)
            .map(|(term, count)| TermCount::new(term, count))
            .collect())
    }

    async fn suggest(&self, prefix: &str, dictionary: Dictionary, count: usize) -> BackendResult<Vec<Suggestion>> {
        let field = match dictionary {
            Dictionary::Concepts => fields::CONCEPTLABEL,
            Dictionary::Predicates => fields::PREDICATELABEL,
        };
        let prefix = prefix.to_lowercase();
        let mut weights: HashMap<String, u64> = HashMap::new();
        for doc in self.matching(&Filter::All) {
            for value in field_values(&doc, field) {
                if value.to_lowercase().starts_with(&prefix) {
                    *weights.entry(value).or_insert(0) += 1;
                }
            }
        }
        Ok(ranked(weights)
            .into_iter()
            .take(count)
            .map(|(term, weight)| Suggestion { term, weight })
            .collect())
    }
}

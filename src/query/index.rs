//! Content index: enriched source documents and pass-through search

use crate::backend::{self, BackendResult, BulkRejection, BulkReport, Engine, IndexSchema, RawQuery};
use crate::backend::scalar_text;
use crate::config::Config;
use crate::enrich::EnrichmentBatch;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Rewrites a free-text query before it reaches the backend,
/// e.g. to lemmatize it the same way indexed content was.
pub trait QueryRewriter: Send + Sync {
    fn rewrite(&self, query: &str) -> String;
}

impl<F> QueryRewriter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn rewrite(&self, query: &str) -> String {
        self(query)
    }
}

pub struct IndexQuery {
    engine: Arc<dyn Engine>,
    timeout: Duration,
    /// Payload field holding the document id
    id_field: String,
    rewriter: Option<Arc<dyn QueryRewriter>>,
}

impl IndexQuery {
    pub fn new(engine: Arc<dyn Engine>, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            id_field: "id".to_string(),
            rewriter: None,
        }
    }

    /// Connect to the configured content index (`{name}`)
    pub fn connect(config: &Config) -> BackendResult<Self> {
        let engine = backend::connect(config, config.content_index_name())?;
        Ok(Self::new(engine, config.timeout()).with_id_field(config.enrich.id_field.clone()))
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn QueryRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub async fn exists(&self) -> BackendResult<bool> {
        self.engine.index_exists(self.engine.index_name()).await
    }

    pub async fn create(&self, schema: &IndexSchema) -> BackendResult<()> {
        self.engine.index_create(schema).await
    }

    /// Create the content index with [`IndexSchema::content`] unless it exists.
    /// Returns whether it was created.
    pub async fn ensure_index(&self) -> BackendResult<bool> {
        if self.exists().await? {
            return Ok(false);
        }
        self.create(&IndexSchema::content()).await?;
        Ok(true)
    }

    pub async fn delete(&self) -> BackendResult<()> {
        self.engine.index_delete().await
    }

    pub async fn indexes(&self) -> BackendResult<Vec<String>> {
        self.engine.indexes().await
    }

    /// Copy each payload's id (string or number, read from the id field) into
    /// the backend `id`. Payloads without one are rejected here.
    fn keyed(&self, documents: Vec<Value>) -> (Vec<Value>, Vec<BulkRejection>) {
        let mut keyed = Vec::with_capacity(documents.len());
        let mut rejected = Vec::new();
        for mut doc in documents {
            match (doc.get(&self.id_field).and_then(scalar_text), doc.as_object_mut()) {
                (Some(id), Some(object)) => {
                    object.insert("id".to_string(), Value::String(id));
                    keyed.push(doc);
                }
                _ => rejected.push(BulkRejection {
                    id: None,
                    reason: format!("document has no '{}' field", self.id_field),
                }),
            }
        }
        (keyed, rejected)
    }

    pub async fn index_documents(&self, documents: Vec<Value>) -> BackendResult<BulkReport> {
        let (keyed, mut rejected) = self.keyed(documents);
        let mut report = self.engine.bulk_index(keyed, self.timeout).await?;
        rejected.append(&mut report.rejected);
        report.rejected = rejected;
        info!(
            index = %self.engine.index_name(),
            indexed = report.indexed,
            rejected = report.rejected.len(),
            "indexed content documents"
        );
        Ok(report)
    }

    /// Index the enriched payloads of a batch
    pub async fn index_batch(&self, batch: &EnrichmentBatch) -> BackendResult<BulkReport> {
        self.index_documents(batch.documents.clone()).await
    }

    /// Run a native query. The `q` parameter goes through the rewriter, if any.
    pub async fn search(&self, query: RawQuery, handler: &str) -> BackendResult<Value> {
        let mut query = query;
        if let (Some(rewriter), Some(q)) = (&self.rewriter, query.get("q").map(str::to_string)) {
            let rewritten = rewriter.rewrite(&q);
            debug!(original = %q, rewritten = %rewritten, "rewrote query");
            query.set("q", rewritten);
        }
        self.engine.raw_query(&query, handler).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryEngine;
    use serde_json::json;

    fn query() -> (Arc<MemoryEngine>, IndexQuery) {
        let engine = Arc::new(MemoryEngine::new("blog"));
        (engine.clone(), IndexQuery::new(engine, Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn index_batch_writes_enriched_payloads() {
        let (engine, index) = query();
        let batch = EnrichmentBatch {
            documents: vec![json!({"id": "a", "body": "foxes run"}), json!({"body": "no id"})],
            ..Default::default()
        };
        let report = index.index_batch(&batch).await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(engine.ids(), vec!["a"]);
    }

    #[tokio::test]
    async fn numeric_ids_become_backend_ids() {
        let (engine, index) = query();
        let batch = EnrichmentBatch {
            documents: vec![json!({"id": 42, "body": "foxes run"})],
            ..Default::default()
        };
        let report = index.index_batch(&batch).await.unwrap();
        assert_eq!(report.indexed, 1);
        assert!(report.is_complete());
        assert_eq!(engine.ids(), vec!["42"]);
    }

    #[tokio::test]
    async fn custom_id_field_is_honoured() {
        let (engine, index) = query();
        let index = index.with_id_field("slug");
        let report = index
            .index_documents(vec![
                json!({"slug": "red-fox", "body": "the red fox"}),
                json!({"slug": 7, "body": "a den"}),
                json!({"id": "x", "body": "wrong field"}),
            ])
            .await
            .unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, "document has no 'slug' field");
        assert_eq!(engine.ids(), vec!["7", "red-fox"]);
        assert_eq!(engine.get("red-fox").unwrap()["slug"], "red-fox");
    }

    #[tokio::test]
    async fn search_applies_rewriter_to_q() {
        let (_, index) = query();
        index
            .index_documents(vec![json!({"id": "a", "body": "the fox runs"})])
            .await
            .unwrap();

        let unrewritten = index
            .search(RawQuery::default().param("q", "foxes"), "select")
            .await
            .unwrap();
        assert_eq!(unrewritten["response"]["numFound"], 0);

        let index = index.with_rewriter(Arc::new(|q: &str| q.trim_end_matches("es").to_string()));
        let rewritten = index
            .search(RawQuery::default().param("q", "foxes"), "select")
            .await
            .unwrap();
        assert_eq!(rewritten["response"]["numFound"], 1);
    }

    #[tokio::test]
    async fn admin_operations_pass_through() {
        let (_, index) = query();
        assert!(index.exists().await.unwrap());
        assert_eq!(index.indexes().await.unwrap(), vec!["blog"]);
        index.delete().await.unwrap();
        assert!(!index.exists().await.unwrap());
        assert!(index.ensure_index().await.unwrap());
        assert!(index.exists().await.unwrap());
        assert!(!index.ensure_index().await.unwrap());
    }
}

//! Elasticsearch engine: terms aggregations, completion suggesters
//! and NDJSON bulk updates

use super::document::fields;
use super::engine::{
    partition_by_id, scalar_text, AggregateRequest, BackendError, BackendResult, BulkRejection, BulkReport, Dictionary, Engine,
    IndexSchema, RawQuery, Suggestion, TermCount,
};
use super::transport::{HttpRequest, Method, Transport};
use crate::config::EngineKind;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const AGGREGATION: &str = "terms";
const SUGGESTION: &str = "labels";

pub struct ElasticEngine {
    transport: Arc<dyn Transport>,
    index: String,
}

impl ElasticEngine {
    pub fn new(transport: Arc<dyn Transport>, index: impl Into<String>) -> Self {
        Self {
            transport,
            index: index.into(),
        }
    }

    fn completion_field(dictionary: Dictionary) -> &'static str {
        match dictionary {
            Dictionary::Concepts => fields::CONCEPTLABEL,
            Dictionary::Predicates => fields::PREDICATELABEL,
        }
    }

    async fn search(&self, body: Value) -> BackendResult<Value> {
        self.raw_query(&RawQuery::default().body(body), "_search").await
    }
}

/// Mapping for the graph index: exact-match fields for aggregation and
/// completion fields for the two suggestion dictionaries.
pub fn graph_mapping() -> Value {
    let keyword = json!({"type": "keyword"});
    json!({
        "mappings": {
            "properties": {
                "id": keyword,
                "key": keyword,
                "idiom": keyword,
                "label": {"type": "text", "fields": {"keyword": {"type": "keyword"}}},
                "length": {"type": "integer"},
                "start": {"type": "integer"},
                "end": {"type": "integer"},
                "docid": keyword,
                "sentenceid": keyword,
                "objectof": keyword,
                "subjectof": keyword,
                "contenttype": keyword,
                "createtime": {"type": "date"},
                "preflabel": keyword,
                "prefcount": {"type": "integer"},
                "total": {"type": "integer"},
                "conceptlabel": {"type": "completion"},
                "predicatelabel": {"type": "completion"}
            }
        }
    })
}

#[async_trait]
impl Engine for ElasticEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Elastic
    }

    fn index_name(&self) -> &str {
        &self.index
    }

    async fn indexes(&self) -> BackendResult<Vec<String>> {
        let request = HttpRequest::get("_cat/indices").query("format", "json");
        let body = self.transport.send(request).await?.ok()?.json()?;
        let rows = body
            .as_array()
            .ok_or_else(|| BackendError::Decode("_cat/indices did not return a list".into()))?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("index").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    async fn index_exists(&self, name: &str) -> BackendResult<bool> {
        let response = self.transport.send(HttpRequest::new(Method::Head, name)).await?;
        match response.status {
            404 => Ok(false),
            _ => response.ok().map(|_| true),
        }
    }

    async fn index_create(&self, schema: &IndexSchema) -> BackendResult<()> {
        let body = schema.body.clone().unwrap_or_else(graph_mapping);
        let request = HttpRequest::new(Method::Put, self.index.as_str()).json(body);
        self.transport.send(request).await?.ok()?;
        info!(index = %self.index, "created elasticsearch index");
        Ok(())
    }

    async fn index_delete(&self) -> BackendResult<()> {
        let response = self
            .transport
            .send(HttpRequest::new(Method::Delete, self.index.as_str()))
            .await?;
        if response.status == 404 {
            return Ok(());
        }
        response.ok()?;
        info!(index = %self.index, "deleted elasticsearch index");
        Ok(())
    }

    async fn bulk_index(&self, documents: Vec<Value>, timeout: Duration) -> BackendResult<BulkReport> {
        let (accepted, mut rejected) = partition_by_id(documents);
        if accepted.is_empty() {
            return Ok(BulkReport { indexed: 0, rejected });
        }
        let submitted = accepted.len();
        let mut lines = String::new();
        for (id, doc) in &accepted {
            lines.push_str(&json!({"index": {"_index": self.index, "_id": id}}).to_string());
            lines.push('\n');
            lines.push_str(&serde_json::to_string(doc)?);
            lines.push('\n');
        }
        let request = HttpRequest::post("_bulk")
            .query("refresh", "true")
            .ndjson(lines)
            .timeout(timeout);
        let body = self.transport.send(request).await?.ok()?.json()?;

        if body.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            let items = body.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
            for item in items {
                let Some(result) = item.get("index") else { continue };
                if let Some(error) = result.get("error") {
                    rejected.push(BulkRejection {
                        id: result.get("_id").and_then(Value::as_str).map(str::to_string),
                        reason: error
                            .get("reason")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| error.to_string()),
                    });
                }
            }
            warn!(index = %self.index, rejected = rejected.len(), "bulk update rejected documents");
        }
        let failed_in_backend = rejected.iter().filter(|r| r.id.is_some()).count();
        let indexed = submitted.saturating_sub(failed_in_backend);
        debug!(index = %self.index, indexed, "elasticsearch bulk update");
        Ok(BulkReport { indexed, rejected })
    }

    async fn raw_query(&self, query: &RawQuery, handler: &str) -> BackendResult<Value> {
        let path = format!("{}/{}", self.index, handler.trim_start_matches('/'));
        let body = query.body.clone().unwrap_or_else(|| json!({}));
        let request = HttpRequest::post(path).queries(&query.params).json(body);
        self.transport.send(request).await?.ok()?.json()
    }

    async fn aggregate(&self, request: &AggregateRequest) -> BackendResult<Vec<TermCount>> {
        let body = json!({
            "size": 0,
            "query": request.filter.to_elastic(),
            "aggs": {
                AGGREGATION: {
                    "terms": {
                        "field": request.field,
                        "size": request.limit,
                        "min_doc_count": request.min_count
                    }
                }
            }
        });
        let response = self.search(body).await?;
        let buckets = response
            .pointer(&format!("/aggregations/{}/buckets", AGGREGATION))
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::Decode(format!("no buckets for field '{}'", request.field)))?;
        Ok(buckets
            .iter()
            .filter_map(|bucket| {
                Some(TermCount::new(
                    scalar_text(bucket.get("key")?)?,
                    bucket.get("doc_count")?.as_u64()?,
                ))
            })
            .collect())
    }

    async fn suggest(&self, prefix: &str, dictionary: Dictionary, count: usize) -> BackendResult<Vec<Suggestion>> {
        let body = json!({
            "_source": false,
            "suggest": {
                SUGGESTION: {
                    "prefix": prefix,
                    "completion": {
                        "field": Self::completion_field(dictionary),
                        "size": count,
                        "skip_duplicates": true
                    }
                }
            }
        });
        let response = self.search(body).await?;
        let options = response
            .pointer(&format!("/suggest/{}/0/options", SUGGESTION))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(options
            .iter()
            .filter_map(|option| {
                Some(Suggestion {
                    term: option.get("text")?.as_str()?.to_string(),
                    weight: option.get("_score").and_then(Value::as_f64).unwrap_or(0.0).round() as u64,
                })
            })
            .collect())
    }
}

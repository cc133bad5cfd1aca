//! Solr engine: cores administered through the CoreAdmin API,
//! aggregations as field facets, suggestions through the suggest handler

use super::engine::{
    partition_by_id, scalar_text, AggregateRequest, BackendError, BackendResult, BulkReport, Dictionary, Engine, IndexSchema,
    RawQuery, Suggestion, TermCount,
};
use super::transport::{HttpRequest, Transport};
use crate::config::EngineKind;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CORES: &str = "admin/cores";

pub struct SolrEngine {
    transport: Arc<dyn Transport>,
    core: String,
}

impl SolrEngine {
    pub fn new(transport: Arc<dyn Transport>, core: impl Into<String>) -> Self {
        Self {
            transport,
            core: core.into(),
        }
    }

    fn dictionary_name(dictionary: Dictionary) -> &'static str {
        match dictionary {
            Dictionary::Concepts => "conceptLabelSuggester",
            Dictionary::Predicates => "predicateLabelSuggester",
        }
    }

    fn core_path(&self, handler: &str) -> String {
        format!("{}/{}", self.core, handler.trim_start_matches('/'))
    }

    async fn cores_status(&self, core: Option<&str>) -> BackendResult<Value> {
        let mut request = HttpRequest::get(CORES).query("action", "STATUS").query("wt", "json");
        if let Some(name) = core {
            request = request.query("core", name);
        }
        let response = self.transport.send(request).await?.ok()?;
        let body = response.json()?;
        body.get("status")
            .cloned()
            .ok_or_else(|| BackendError::Decode("core status response has no 'status'".into()))
    }
}

#[async_trait]
impl Engine for SolrEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Solr
    }

    fn index_name(&self) -> &str {
        &self.core
    }

    async fn indexes(&self) -> BackendResult<Vec<String>> {
        let status = self.cores_status(None).await?;
        Ok(status
            .as_object()
            .map(|cores| cores.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn index_exists(&self, name: &str) -> BackendResult<bool> {
        let status = self.cores_status(Some(name)).await?;
        // Solr answers unknown cores with an empty status object
        Ok(status.get(name).and_then(|core| core.get("name")).is_some())
    }

    async fn index_create(&self, schema: &IndexSchema) -> BackendResult<()> {
        let mut request = HttpRequest::get(CORES)
            .query("action", "CREATE")
            .query("name", &self.core)
            .query("wt", "json");
        request = match &schema.instance_dir {
            Some(dir) => request
                .query("instanceDir", dir.display())
                .query("config", "solrconfig.xml")
                .query("dataDir", "data"),
            None => request.query("instanceDir", &self.core).query("configSet", "_default"),
        };
        self.transport.send(request).await?.ok()?;
        info!(core = %self.core, "created solr core");
        Ok(())
    }

    async fn index_delete(&self) -> BackendResult<()> {
        if !self.index_exists(&self.core).await? {
            return Ok(());
        }
        let request = HttpRequest::get(CORES)
            .query("action", "UNLOAD")
            .query("core", &self.core)
            .query("deleteIndex", "true")
            .query("deleteDataDir", "true")
            .query("deleteInstanceDir", "true")
            .query("wt", "json");
        self.transport.send(request).await?.ok()?;
        info!(core = %self.core, "deleted solr core");
        Ok(())
    }

    async fn bulk_index(&self, documents: Vec<Value>, timeout: Duration) -> BackendResult<BulkReport> {
        let (accepted, rejected) = partition_by_id(documents);
        if accepted.is_empty() {
            return Ok(BulkReport { indexed: 0, rejected });
        }
        let indexed = accepted.len();
        let body = Value::Array(accepted.into_iter().map(|(_, doc)| doc).collect());
        let request = HttpRequest::post(self.core_path("update"))
            .query("commit", "true")
            .query("wt", "json")
            .json(body)
            .timeout(timeout);
        self.transport.send(request).await?.ok()?;
        debug!(core = %self.core, indexed, rejected = rejected.len(), "solr bulk update");
        Ok(BulkReport { indexed, rejected })
    }

    async fn raw_query(&self, query: &RawQuery, handler: &str) -> BackendResult<Value> {
        let mut request = match &query.body {
            Some(body) => HttpRequest::post(self.core_path(handler)).json(body.clone()),
            None => HttpRequest::get(self.core_path(handler)),
        };
        request = request.queries(&query.params);
        if query.get("wt").is_none() {
            request = request.query("wt", "json");
        }
        self.transport.send(request).await?.ok()?.json()
    }

    async fn aggregate(&self, request: &AggregateRequest) -> BackendResult<Vec<TermCount>> {
        let query = RawQuery::default()
            .param("q", "*:*")
            .param("fq", request.filter.to_solr())
            .param("rows", "0")
            .param("facet", "on")
            .param("facet.field", &request.field)
            .param("facet.limit", request.limit.to_string())
            .param("facet.mincount", request.min_count.to_string());
        let body = self.raw_query(&query, "select").await?;
        parse_facets(&body, &request.field)
    }

    async fn suggest(&self, prefix: &str, dictionary: Dictionary, count: usize) -> BackendResult<Vec<Suggestion>> {
        let name = Self::dictionary_name(dictionary);
        let query = RawQuery::default()
            .param("suggest", "true")
            .param("suggest.dictionary", name)
            .param("suggest.q", prefix)
            .param("suggest.count", count.to_string());
        let body = self.raw_query(&query, "suggest").await?;
        Ok(parse_suggestions(&body, name, prefix))
    }
}

/// `facet_counts.facet_fields.<field>` is a flat `[term, count, term, count, ...]` list
fn parse_facets(body: &Value, field: &str) -> BackendResult<Vec<TermCount>> {
    let flat = body
        .pointer("/facet_counts/facet_fields")
        .and_then(|fields| fields.get(field))
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Decode(format!("no facet counts for field '{}'", field)))?;
    Ok(flat
        .chunks(2)
        .filter_map(|pair| match pair {
            [term, count] => Some(TermCount::new(scalar_text(term)?, count.as_u64()?)),
            _ => None,
        })
        .collect())
}

fn parse_suggestions(body: &Value, dictionary: &str, prefix: &str) -> Vec<Suggestion> {
    body.get("suggest")
        .and_then(|s| s.get(dictionary))
        .and_then(|d| d.get(prefix))
        .and_then(|p| p.get("suggestions"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(Suggestion {
                        term: item.get("term")?.as_str()?.to_string(),
                        weight: item.get("weight").and_then(Value::as_u64).unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::filter::Filter;
    use crate::backend::scripted::ScriptedTransport;
    use crate::backend::transport::{Body, Method};
    use serde_json::json;

    fn engine() -> (Arc<ScriptedTransport>, SolrEngine) {
        let transport = Arc::new(ScriptedTransport::new());
        let engine = SolrEngine::new(transport.clone(), "blog-graph");
        (transport, engine)
    }

    #[tokio::test]
    async fn aggregate_normalizes_flat_facets() {
        let (transport, engine) = engine();
        transport.respond(
            200,
            json!({"facet_counts": {"facet_fields": {"preflabel": ["fox", 5, "den", 2]}}}),
        );
        let request = AggregateRequest::new("preflabel")
            .filter(Filter::term("contenttype", "concept"))
            .limit(10);
        let counts = engine.aggregate(&request).await.unwrap();

        assert_eq!(counts, vec![TermCount::new("fox", 5), TermCount::new("den", 2)]);
        let sent = &transport.requests()[0];
        assert_eq!(sent.path, "blog-graph/select");
        assert_eq!(sent.query_value("fq"), Some(r#"contenttype:"concept""#));
        assert_eq!(sent.query_value("facet.field"), Some("preflabel"));
        assert_eq!(sent.query_value("facet.limit"), Some("10"));
        assert_eq!(sent.query_value("wt"), Some("json"));
    }

    #[tokio::test]
    async fn aggregate_without_facets_is_decode_error() {
        let (transport, engine) = engine();
        transport.respond(200, json!({"response": {}}));
        let err = engine.aggregate(&AggregateRequest::new("preflabel")).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let (transport, engine) = engine();
        transport.fail(BackendError::Timeout("blog-graph/select".into()));
        let err = engine.aggregate(&AggregateRequest::new("preflabel")).await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout(_)));
    }

    #[tokio::test]
    async fn suggest_reads_dictionary_results() {
        let (transport, engine) = engine();
        transport.respond(
            200,
            json!({"suggest": {"conceptLabelSuggester": {"fo": {"numFound": 2, "suggestions": [
                {"term": "fox", "weight": 7, "payload": ""},
                {"term": "forest", "weight": 3, "payload": ""}
            ]}}}}),
        );
        let suggestions = engine.suggest("fo", Dictionary::Concepts, 5).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0], Suggestion { term: "fox".into(), weight: 7 });
        assert_eq!(transport.requests()[0].path, "blog-graph/suggest");
    }

    #[tokio::test]
    async fn suggest_missing_dictionary_is_empty() {
        let (transport, engine) = engine();
        transport.respond(200, json!({"suggest": {}}));
        let suggestions = engine.suggest("fo", Dictionary::Predicates, 5).await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn bulk_posts_documents_with_ids_only() {
        let (transport, engine) = engine();
        let report = engine
            .bulk_index(vec![json!({"id": "fox_a_0"}), json!({"key": "den"})], Duration::from_secs(3))
            .await
            .unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(report.rejected.len(), 1);
        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.path, "blog-graph/update");
        assert_eq!(sent.query_value("commit"), Some("true"));
        assert_eq!(sent.timeout, Some(Duration::from_secs(3)));
        assert_eq!(sent.body, Some(Body::Json(json!([{"id": "fox_a_0"}]))));
    }

    #[tokio::test]
    async fn bulk_failure_status_is_error() {
        let (transport, engine) = engine();
        transport.respond(500, json!({"error": {"msg": "down"}}));
        let err = engine
            .bulk_index(vec![json!({"id": "x"})], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn exists_checks_core_status() {
        let (transport, engine) = engine();
        transport
            .respond(200, json!({"status": {"blog-graph": {"name": "blog-graph"}}}))
            .respond(200, json!({"status": {"other": {}}}));
        assert!(engine.index_exists("blog-graph").await.unwrap());
        assert!(!engine.index_exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn delete_of_missing_core_sends_no_unload() {
        let (transport, engine) = engine();
        transport.respond(200, json!({"status": {"blog-graph": {}}}));
        engine.index_delete().await.unwrap();
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn create_uses_instance_dir_when_given() {
        let (transport, engine) = engine();
        let schema = IndexSchema::default().with_instance_dir("/var/solr/blog-graph");
        engine.index_create(&schema).await.unwrap();
        let sent = &transport.requests()[0];
        assert_eq!(sent.query_value("action"), Some("CREATE"));
        assert_eq!(sent.query_value("instanceDir"), Some("/var/solr/blog-graph"));
        assert_eq!(sent.query_value("config"), Some("solrconfig.xml"));
    }

    #[tokio::test]
    async fn indexes_lists_core_names() {
        let (transport, engine) = engine();
        transport.respond(200, json!({"status": {"blog": {"name": "blog"}, "blog-graph": {"name": "blog-graph"}}}));
        let mut names = engine.indexes().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["blog", "blog-graph"]);
    }
}

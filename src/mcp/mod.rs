//! MCP server for spangraph. Exposes the graph query surface via the
//! Model Context Protocol.

pub mod params;

use crate::chunk::ContentType;
use crate::config::Config;
use crate::query::{FacetLimits, GraphQuery, DEFAULT_SUGGESTIONS};
use params::*;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const DEFAULT_BRANCHES: usize = 10;
const DEFAULT_OBJECTS: usize = 5;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => err_text(e.to_string()),
    }
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn limits(min_count: Option<u64>, limit: Option<usize>) -> FacetLimits {
    let defaults = FacetLimits::default();
    FacetLimits {
        min_count: min_count.unwrap_or(defaults.min_count),
        limit: limit.unwrap_or(defaults.limit),
    }
}

fn parse_content_type(value: Option<&str>) -> Result<Option<ContentType>, String> {
    match value.map(str::to_lowercase).as_deref() {
        None => Ok(None),
        Some("concept") => Ok(Some(ContentType::Concept)),
        Some("predicate") => Ok(Some(ContentType::Predicate)),
        Some(other) => Err(format!("unknown content type '{}'", other)),
    }
}

// ---------------------------------------------------------------------------
// SpangraphMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SpangraphMcpServer {
    graph: Arc<GraphQuery>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SpangraphMcpServer {
    pub fn new(graph: Arc<GraphQuery>) -> Self {
        Self {
            graph,
            tool_router: Self::tool_router(),
        }
    }

    // ── Suggestion tools ────────────────────────────────────────────────

    #[tool(description = "Suggest concept labels starting with a prefix")]
    async fn suggest_concepts(&self, Parameters(p): Parameters<SuggestParams>) -> Result<CallToolResult, McpError> {
        match self
            .graph
            .suggest_concepts(&p.prefix, p.count.unwrap_or(DEFAULT_SUGGESTIONS))
            .await
        {
            Ok(found) => ok_json(&found),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Suggest predicate labels starting with a prefix")]
    async fn suggest_predicates(&self, Parameters(p): Parameters<SuggestParams>) -> Result<CallToolResult, McpError> {
        match self
            .graph
            .suggest_predicates(&p.prefix, p.count.unwrap_or(DEFAULT_SUGGESTIONS))
            .await
        {
            Ok(found) => ok_json(&found),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "For each concept suggested for a prefix, list the verbs found near it")]
    async fn explore(&self, Parameters(p): Parameters<ExploreParams>) -> Result<CallToolResult, McpError> {
        let count = p.count.unwrap_or(DEFAULT_SUGGESTIONS);
        let branches = p.branches.unwrap_or(DEFAULT_BRANCHES);
        match self.graph.explore(&p.prefix, count, branches).await {
            Ok(found) => ok_json(&found),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Facet tools ─────────────────────────────────────────────────────

    #[tool(description = "Rank the values of an index field by document count")]
    async fn aggregate(&self, Parameters(p): Parameters<FacetParams>) -> Result<CallToolResult, McpError> {
        let content_type = match parse_content_type(p.content_type.as_deref()) {
            Ok(kind) => kind,
            Err(msg) => return err_text(msg),
        };
        match self
            .graph
            .facets(&p.field, content_type, limits(p.min_count, p.limit))
            .await
        {
            Ok(counts) => ok_json(&counts),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Verbs governing a concept as subject or object")]
    async fn verbs_near_concept(&self, Parameters(p): Parameters<ConceptParams>) -> Result<CallToolResult, McpError> {
        match self
            .graph
            .verbs_near_concept(&p.concept, limits(p.min_count, p.limit))
            .await
        {
            Ok(counts) => ok_json(&counts),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Concepts governed by a verb")]
    async fn concepts_near_verb(&self, Parameters(p): Parameters<VerbParams>) -> Result<CallToolResult, McpError> {
        match self
            .graph
            .concepts_near_verb(&p.verb, limits(p.min_count, p.limit))
            .await
        {
            Ok(counts) => ok_json(&counts),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Concepts sharing a sentence with a concept where both relate to a verb")]
    async fn concept_verb_concepts(
        &self,
        Parameters(p): Parameters<ConceptVerbParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .graph
            .concept_verb_concepts(&p.concept, &p.verb, limits(p.min_count, p.limit))
            .await
        {
            Ok(counts) => ok_json(&counts),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Top concept and predicate labels of the graph index")]
    async fn summarize(&self, Parameters(p): Parameters<SummarizeParams>) -> Result<CallToolResult, McpError> {
        match self.graph.summarize(limits(p.min_count, p.limit)).await {
            Ok(summary) => ok_json(&summary),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Graph tools ─────────────────────────────────────────────────────

    #[tool(description = "Subject → predicate → object tree for a concept")]
    async fn graph(&self, Parameters(p): Parameters<GraphParams>) -> Result<CallToolResult, McpError> {
        let branches = p.branches.unwrap_or(DEFAULT_BRANCHES);
        let objects = p.objects.unwrap_or(DEFAULT_OBJECTS);
        match self.graph.graph(&p.subject, branches, objects).await {
            Ok(tree) => ok_json(&tree),
            Err(e) => err_text(e.to_string()),
        }
    }
}

#[tool_handler]
impl ServerHandler for SpangraphMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "spangraph MCP server: concept/predicate suggestions, facets and subject-predicate-object graphs"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_mcp_server(config: &Config) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let graph = match GraphQuery::connect(config) {
            Ok(graph) => graph,
            Err(e) => {
                eprintln!("failed to connect to {}: {}", config.host, e);
                return 1;
            }
        };

        let server = SpangraphMcpServer::new(Arc::new(graph));
        info!(host = %config.host, index = %config.graph_index_name(), "spangraph mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryEngine;
    use std::time::Duration;

    fn server() -> SpangraphMcpServer {
        let engine = Arc::new(MemoryEngine::new("test-graph"));
        SpangraphMcpServer::new(Arc::new(GraphQuery::new(engine, Duration::from_secs(1))))
    }

    #[test]
    fn content_type_parsing() {
        assert_eq!(parse_content_type(None), Ok(None));
        assert_eq!(parse_content_type(Some("Concept")), Ok(Some(ContentType::Concept)));
        assert!(parse_content_type(Some("noun")).is_err());
    }

    #[test]
    fn limits_fill_defaults() {
        assert_eq!(limits(None, Some(3)), FacetLimits { min_count: 1, limit: 3 });
    }

    #[tokio::test]
    async fn aggregate_rejects_unknown_content_type() {
        let result = server()
            .aggregate(Parameters(FacetParams {
                field: "preflabel".into(),
                content_type: Some("noun".into()),
                min_count: None,
                limit: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn graph_tool_returns_tree_json() {
        let result = server()
            .graph(Parameters(GraphParams {
                subject: "fox".into(),
                branches: None,
                objects: None,
            }))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
    }

    #[test]
    fn server_advertises_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
    }
}

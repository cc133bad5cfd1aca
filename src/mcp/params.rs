//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

// ── Suggestion params ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SuggestParams {
    #[schemars(description = "Prefix typed so far")]
    pub prefix: String,
    #[schemars(description = "Maximum number of suggestions (default 5)")]
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExploreParams {
    #[schemars(description = "Prefix of the concepts to explore")]
    pub prefix: String,
    #[schemars(description = "Maximum number of concepts (default 5)")]
    pub count: Option<usize>,
    #[schemars(description = "Verbs listed per concept (default 10)")]
    pub branches: Option<usize>,
}

// ── Facet params ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FacetParams {
    #[schemars(description = "Index field to aggregate, e.g. 'preflabel' or 'subjectof'")]
    pub field: String,
    #[schemars(description = "Restrict to 'concept' or 'predicate' documents")]
    pub content_type: Option<String>,
    #[schemars(description = "Minimum count per term (default 1)")]
    pub min_count: Option<u64>,
    #[schemars(description = "Maximum number of terms (default 100)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConceptParams {
    #[schemars(description = "Concept label")]
    pub concept: String,
    pub min_count: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VerbParams {
    #[schemars(description = "Verb lemma")]
    pub verb: String,
    pub min_count: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConceptVerbParams {
    #[schemars(description = "Concept label")]
    pub concept: String,
    #[schemars(description = "Verb lemma governing the concept")]
    pub verb: String,
    pub min_count: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SummarizeParams {
    pub min_count: Option<u64>,
    pub limit: Option<usize>,
}

// ── Graph params ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GraphParams {
    #[schemars(description = "Subject concept at the root of the tree")]
    pub subject: String,
    #[schemars(description = "Number of predicate branches (default 10)")]
    pub branches: Option<usize>,
    #[schemars(description = "Objects per branch (default 5)")]
    pub objects: Option<usize>,
}

//! Backend-agnostic filter expressions
//!
//! Graph queries describe which span documents they want with a [`Filter`];
//! each engine renders it into its own query language.

use super::document::fields;
use serde_json::{json, Value};

/// A boolean filter over span documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document
    All,
    /// Exact value on one field
    Term { field: String, value: String },
    /// Any of several exact values on one field
    Terms { field: String, values: Vec<String> },
    /// The phrase appears in the document's preflabel or label
    Mentions(String),
    AnyOf(Vec<Filter>),
    AllOf(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn mentions(phrase: impl Into<String>) -> Self {
        Filter::Mentions(phrase.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::AllOf(mut parts) => {
                parts.push(other);
                Filter::AllOf(parts)
            }
            this => Filter::AllOf(vec![this, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Render as a Solr standard query parser expression
    pub fn to_solr(&self) -> String {
        match self {
            Filter::All => "*:*".to_string(),
            Filter::Term { field, value } => format!("{}:{}", field, solr_phrase(value)),
            Filter::Terms { field, values } => {
                if values.is_empty() {
                    return "-*:*".to_string();
                }
                let alternatives: Vec<String> = values.iter().map(|v| solr_phrase(v)).collect();
                format!("{}:({})", field, alternatives.join(" OR "))
            }
            Filter::Mentions(phrase) => {
                let quoted = solr_phrase(phrase);
                format!("({}:{} OR {}:{})", fields::PREFLABEL, quoted, fields::LABEL, quoted)
            }
            Filter::AnyOf(parts) => join_solr(parts, " OR "),
            Filter::AllOf(parts) => join_solr(parts, " AND "),
            Filter::Not(inner) => format!("(*:* -{})", inner.to_solr()),
        }
    }

    /// Render as an Elasticsearch query DSL clause
    pub fn to_elastic(&self) -> Value {
        match self {
            Filter::All => json!({"match_all": {}}),
            Filter::Term { field, value } => json!({"term": {field.as_str(): value}}),
            Filter::Terms { field, values } => json!({"terms": {field.as_str(): values}}),
            Filter::Mentions(phrase) => json!({
                "multi_match": {
                    "query": phrase,
                    "type": "phrase",
                    "fields": [fields::PREFLABEL, fields::LABEL]
                }
            }),
            Filter::AnyOf(parts) => {
                let should: Vec<Value> = parts.iter().map(Filter::to_elastic).collect();
                json!({"bool": {"should": should, "minimum_should_match": 1}})
            }
            Filter::AllOf(parts) => {
                let filter: Vec<Value> = parts.iter().map(Filter::to_elastic).collect();
                json!({"bool": {"filter": filter}})
            }
            Filter::Not(inner) => json!({"bool": {"must_not": [inner.to_elastic()]}}),
        }
    }
}

fn join_solr(parts: &[Filter], op: &str) -> String {
    if parts.is_empty() {
        return if op.trim() == "OR" { "-*:*".to_string() } else { "*:*".to_string() };
    }
    let rendered: Vec<String> = parts.iter().map(Filter::to_solr).collect();
    format!("({})", rendered.join(op))
}

/// Quote a value as a Solr phrase
fn solr_phrase(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

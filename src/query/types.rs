//! Query result structures

use crate::backend::{BackendResult, BulkReport, Suggestion, TermCount};
use serde::Serialize;

/// Bounds for a facet-style query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetLimits {
    /// Minimum count for a term to be returned
    pub min_count: u64,
    /// Maximum number of terms returned
    pub limit: usize,
}

impl Default for FacetLimits {
    fn default() -> Self {
        Self {
            min_count: 1,
            limit: 100,
        }
    }
}

impl FacetLimits {
    pub fn top(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Object concept under a predicate branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLeaf {
    pub label: String,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateBranch {
    pub label: String,
    pub weight: u64,
    pub objects: Vec<GraphLeaf>,
}

/// subject → predicate(weight) → object(weight)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphTree {
    pub subject: String,
    pub predicates: Vec<PredicateBranch>,
}

impl GraphTree {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Indented plain-text rendering
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.subject);
        for branch in &self.predicates {
            out.push_str(&format!("  {} ({})\n", branch.label, branch.weight));
            for leaf in &branch.objects {
                out.push_str(&format!("    {} ({})\n", leaf.label, leaf.weight));
            }
        }
        out
    }
}

/// Concept and predicate facets of a whole graph index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub concepts: Vec<TermCount>,
    pub predicates: Vec<TermCount>,
}

/// A suggested concept and the verbs found near it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exploration {
    pub concept: Suggestion,
    pub verbs: Vec<TermCount>,
}

/// Result of indexing one batch: each document type is a separate bulk call.
#[derive(Debug)]
pub struct IndexOutcome {
    pub predicates: BackendResult<BulkReport>,
    pub concepts: BackendResult<BulkReport>,
}

impl IndexOutcome {
    /// Both calls succeeded and no document was rejected
    pub fn is_complete(&self) -> bool {
        matches!(&self.predicates, Ok(report) if report.is_complete())
            && matches!(&self.concepts, Ok(report) if report.is_complete())
    }

    pub fn indexed(&self) -> usize {
        [&self.predicates, &self.concepts]
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|report| report.indexed)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;

    #[test]
    fn render_indents_levels() {
        let tree = GraphTree {
            subject: "fox".into(),
            predicates: vec![PredicateBranch {
                label: "jump".into(),
                weight: 3,
                objects: vec![GraphLeaf {
                    label: "lazy dog".into(),
                    weight: 2,
                }],
            }],
        };
        assert_eq!(tree.render(), "fox\n  jump (3)\n    lazy dog (2)\n");
    }

    #[test]
    fn outcome_counts_successful_calls_only() {
        let outcome = IndexOutcome {
            predicates: Err(BackendError::Timeout("http://localhost".into())),
            concepts: Ok(BulkReport {
                indexed: 4,
                rejected: vec![],
            }),
        };
        assert_eq!(outcome.indexed(), 4);
        assert!(!outcome.is_complete());
    }
}

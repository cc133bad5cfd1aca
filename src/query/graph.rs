//! Graph orchestration over the span index
//!
//! Every query here is a short pipeline of [`Engine`] aggregations over the
//! span documents written by [`GraphQuery::index`].

use super::types::{Exploration, FacetLimits, GraphLeaf, GraphTree, IndexOutcome, PredicateBranch, Summary};
use crate::backend::{
    self, fields, graph_documents, AggregateRequest, BackendResult, BulkReport, Dictionary, Engine, Filter,
    IndexSchema, Suggestion, TermCount,
};
use crate::chunk::ContentType;
use crate::config::Config;
use crate::enrich::EnrichmentBatch;
use crate::group::ConceptGroup;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on co-occurring sentences considered per concept/verb pair
const SENTENCE_LIMIT: usize = 1000;

/// Default number of suggestions returned
pub const DEFAULT_SUGGESTIONS: usize = 5;

pub struct GraphQuery {
    engine: Arc<dyn Engine>,
    timeout: Duration,
}

fn concepts() -> Filter {
    Filter::term(fields::CONTENTTYPE, ContentType::Concept.as_str())
}

fn governed_by(verb: &str) -> Filter {
    Filter::AnyOf(vec![
        Filter::term(fields::SUBJECTOF, verb),
        Filter::term(fields::OBJECTOF, verb),
    ])
}

impl GraphQuery {
    pub fn new(engine: Arc<dyn Engine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Connect to the configured graph index (`{name}-graph`)
    pub fn connect(config: &Config) -> BackendResult<Self> {
        let engine = backend::connect(config, config.graph_index_name())?;
        Ok(Self::new(engine, config.timeout()))
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Create the graph index unless it exists. Returns whether it was created.
    pub async fn ensure_index(&self, schema: &IndexSchema) -> BackendResult<bool> {
        if self.engine.index_exists(self.engine.index_name()).await? {
            return Ok(false);
        }
        self.engine.index_create(schema).await?;
        Ok(true)
    }

    pub async fn indexes(&self) -> BackendResult<Vec<String>> {
        self.engine.indexes().await
    }

    pub async fn delete(&self) -> BackendResult<()> {
        self.engine.index_delete().await
    }

    pub async fn index(&self, batch: &EnrichmentBatch) -> IndexOutcome {
        self.index_at(batch, Utc::now()).await
    }

    /// Index a batch's groups with a fixed creation time.
    ///
    /// Predicates and concepts go out as two bulk calls; a failure of one
    /// does not prevent the other.
    pub async fn index_at(&self, batch: &EnrichmentBatch, createtime: DateTime<Utc>) -> IndexOutcome {
        let predicates = self
            .bulk(&batch.predicate_groups, ContentType::Predicate, createtime)
            .await;
        let concepts = self.bulk(&batch.concept_groups, ContentType::Concept, createtime).await;
        let outcome = IndexOutcome { predicates, concepts };
        info!(
            index = %self.engine.index_name(),
            indexed = outcome.indexed(),
            complete = outcome.is_complete(),
            "indexed graph batch"
        );
        outcome
    }

    async fn bulk(
        &self,
        groups: &[ConceptGroup],
        content_type: ContentType,
        createtime: DateTime<Utc>,
    ) -> BackendResult<BulkReport> {
        let documents = graph_documents(groups, content_type, createtime)
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.engine.bulk_index(documents, self.timeout).await;
        match &result {
            Ok(report) if !report.is_complete() => {
                warn!(%content_type, rejected = report.rejected.len(), "bulk call rejected documents")
            }
            Ok(report) => debug!(%content_type, indexed = report.indexed, "bulk call complete"),
            Err(e) => warn!(%content_type, error = %e, "bulk call failed"),
        }
        result
    }

    /// Verbs governing concept documents that mention `concept`: the
    /// subject-role aggregation followed by the object-role aggregation.
    pub async fn verbs_near_concept(&self, concept: &str, limits: FacetLimits) -> BackendResult<Vec<TermCount>> {
        let filter = concepts().and(Filter::mentions(concept));
        let mut verbs = self.aggregate(fields::SUBJECTOF, filter.clone(), limits).await?;
        verbs.extend(self.aggregate(fields::OBJECTOF, filter, limits).await?);
        Ok(verbs)
    }

    /// Concepts sharing a sentence with `concept` where both are governed by `verb`
    pub async fn concept_verb_concepts(
        &self,
        concept: &str,
        verb: &str,
        limits: FacetLimits,
    ) -> BackendResult<Vec<TermCount>> {
        let subject = concepts().and(Filter::mentions(concept)).and(governed_by(verb));
        let sentences = self
            .aggregate(fields::SENTENCEID, subject.clone(), FacetLimits::top(SENTENCE_LIMIT))
            .await?;
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        // the subject's own groups, whatever their canonical label
        let subject_keys = self
            .aggregate(fields::KEY, subject, FacetLimits::top(SENTENCE_LIMIT))
            .await?;
        let filter = concepts()
            .and(Filter::terms(fields::SENTENCEID, sentences.into_iter().map(|s| s.term)))
            .and(Filter::terms(fields::KEY, subject_keys.into_iter().map(|k| k.term)).not())
            .and(Filter::term(fields::PREFLABEL, concept).not());
        self.aggregate(fields::PREFLABEL, filter, limits).await
    }

    /// Concepts governed by `verb` in either role
    pub async fn concepts_near_verb(&self, verb: &str, limits: FacetLimits) -> BackendResult<Vec<TermCount>> {
        self.aggregate(fields::PREFLABEL, concepts().and(governed_by(verb)), limits)
            .await
    }

    pub async fn suggest_concepts(&self, prefix: &str, count: usize) -> BackendResult<Vec<Suggestion>> {
        self.engine.suggest(prefix, Dictionary::Concepts, count).await
    }

    pub async fn suggest_predicates(&self, prefix: &str, count: usize) -> BackendResult<Vec<Suggestion>> {
        self.engine.suggest(prefix, Dictionary::Predicates, count).await
    }

    /// Ranked values of any index field, optionally restricted to one content type
    pub async fn facets(
        &self,
        field: &str,
        content_type: Option<ContentType>,
        limits: FacetLimits,
    ) -> BackendResult<Vec<TermCount>> {
        let filter = match content_type {
            Some(kind) => Filter::term(fields::CONTENTTYPE, kind.as_str()),
            None => Filter::All,
        };
        self.aggregate(field, filter, limits).await
    }

    /// Preferred-label facets of each content type
    pub async fn summarize(&self, limits: FacetLimits) -> BackendResult<Summary> {
        let concepts = self.aggregate(fields::PREFLABEL, concepts(), limits).await?;
        let predicates = self
            .aggregate(
                fields::PREFLABEL,
                Filter::term(fields::CONTENTTYPE, ContentType::Predicate.as_str()),
                limits,
            )
            .await?;
        Ok(Summary { concepts, predicates })
    }

    /// Build the subject → predicate → object tree for `subject`.
    ///
    /// Branches are the `branches` highest-weighted verbs near the subject;
    /// each carries the `objects` highest-weighted co-occurring concepts.
    pub async fn graph(&self, subject: &str, branches: usize, objects: usize) -> BackendResult<GraphTree> {
        let verbs = rank_verbs(self.verbs_near_concept(subject, FacetLimits::default()).await?);
        let mut predicates = Vec::new();
        for verb in verbs.into_iter().take(branches) {
            let leaves = self
                .concept_verb_concepts(subject, &verb.term, FacetLimits::top(objects))
                .await?
                .into_iter()
                .map(|c| GraphLeaf {
                    label: c.term,
                    weight: c.count,
                })
                .collect();
            predicates.push(PredicateBranch {
                label: verb.term,
                weight: verb.count,
                objects: leaves,
            });
        }
        debug!(subject, branches = predicates.len(), "built graph");
        Ok(GraphTree {
            subject: subject.to_string(),
            predicates,
        })
    }

    /// Suggested concepts for `prefix`, each with its top `branches` verbs
    pub async fn explore(&self, prefix: &str, count: usize, branches: usize) -> BackendResult<Vec<Exploration>> {
        let mut found = Vec::new();
        for concept in self.suggest_concepts(prefix, count).await? {
            let verbs = rank_verbs(self.verbs_near_concept(&concept.term, FacetLimits::default()).await?)
                .into_iter()
                .take(branches)
                .collect();
            found.push(Exploration { concept, verbs });
        }
        Ok(found)
    }

    async fn aggregate(&self, field: &str, filter: Filter, limits: FacetLimits) -> BackendResult<Vec<TermCount>> {
        let request = AggregateRequest::new(field)
            .filter(filter)
            .min_count(limits.min_count)
            .limit(limits.limit);
        self.engine.aggregate(&request).await
    }
}

/// Descending by count, keeping the first occurrence of each verb.
fn rank_verbs(mut verbs: Vec<TermCount>) -> Vec<TermCount> {
    verbs.sort_by(|a, b| b.count.cmp(&a.count));
    let mut seen = HashSet::new();
    verbs.retain(|v| seen.insert(v.term.clone()));
    verbs
}

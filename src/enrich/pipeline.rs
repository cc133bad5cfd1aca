//! Batch enrichment: documents → spans → groups → canonical labels

use super::types::{
    DocumentChunks, DocumentError, DropStats, EnrichConfig, EnrichError, EnrichResult, EnrichmentBatch,
    CONCEPTS_FIELD, PREDICATES_FIELD,
};
use crate::annotation::AnnotatedDocument;
use crate::chunk::{Chunker, DerivedForms, Label, NoDerivedForms, SentenceRef, TermBuilder};
use crate::group::{ConceptGroup, Grouper};
use crate::storage::PreflabelStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Runs enrichment batches against one preflabel store.
///
/// Chunking is per document and side-effect free. Grouping waits for the
/// whole batch, and canonicalization goes through the store.
pub struct Enricher {
    config: EnrichConfig,
    chunker: Chunker,
    grouper: Grouper,
    store: Arc<dyn PreflabelStore>,
}

impl Enricher {
    pub fn new(config: EnrichConfig, store: Arc<dyn PreflabelStore>) -> Self {
        Self::with_derived_forms(config, store, Arc::new(NoDerivedForms))
    }

    pub fn with_derived_forms(
        config: EnrichConfig,
        store: Arc<dyn PreflabelStore>,
        derived: Arc<dyn DerivedForms>,
    ) -> Self {
        let builder = TermBuilder::new(Arc::new(config.tags.clone()), derived);
        let chunker = Chunker::new(builder, config.chunker_config());
        let grouper = Grouper::new(config.min_labels);
        Self {
            config,
            chunker,
            grouper,
            store,
        }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Enrich a batch on the calling thread.
    pub fn enrich(&self, documents: Vec<AnnotatedDocument>) -> EnrichResult<EnrichmentBatch> {
        info!(documents = documents.len(), "enrichment batch started");
        let chunked = documents
            .into_iter()
            .enumerate()
            .map(|(index, doc)| chunk_document(&self.chunker, &self.config, index, doc))
            .collect();
        self.finish(chunked)
    }

    /// Enrich a batch, chunking documents on blocking worker tasks.
    ///
    /// All workers are joined before grouping starts.
    pub async fn enrich_concurrent(&self, documents: Vec<AnnotatedDocument>) -> EnrichResult<EnrichmentBatch> {
        info!(documents = documents.len(), "concurrent enrichment batch started");
        let mut set = JoinSet::new();
        for (index, doc) in documents.into_iter().enumerate() {
            let chunker = self.chunker.clone();
            let config = self.config.clone();
            set.spawn_blocking(move || chunk_document(&chunker, &config, index, doc));
        }

        let mut chunked = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            chunked.push(joined.map_err(|e| EnrichError::Chunking(e.to_string()))?);
        }
        chunked.sort_by_key(|c: &Result<DocumentChunks, DocumentError>| match c {
            Ok(chunks) => chunks.index,
            Err(err) => err.index,
        });

        self.finish(chunked)
    }

    fn finish(&self, chunked: Vec<Result<DocumentChunks, DocumentError>>) -> EnrichResult<EnrichmentBatch> {
        let mut batch = EnrichmentBatch::default();
        let mut concept_pool = Vec::new();
        let mut predicate_pool = Vec::new();

        for result in chunked {
            let chunks = match result {
                Ok(chunks) => chunks,
                Err(err) => {
                    warn!(error = %err, "document skipped");
                    batch.errors.push(err);
                    continue;
                }
            };

            batch.dropped.short_concepts += chunks.short_concepts;
            batch.dropped.short_predicates += chunks.short_predicates;

            let mut payload = chunks.payload;
            if let Some(fields) = payload.as_object_mut() {
                fields.insert(CONCEPTS_FIELD.to_string(), by_key(&chunks.concepts));
                fields.insert(PREDICATES_FIELD.to_string(), by_key(&chunks.predicates));
            }
            batch.documents.push(payload);

            concept_pool.extend(chunks.concepts);
            predicate_pool.extend(chunks.predicates);
        }

        let concepts = self.grouper.group(concept_pool);
        let predicates = self.grouper.group(predicate_pool);
        batch.dropped.concept_groups = concepts.dropped;
        batch.dropped.predicate_groups = predicates.dropped;

        batch.concept_groups = self.canonicalize(concepts.groups)?;
        batch.predicate_groups = self.canonicalize(predicates.groups)?;

        log_summary(&batch);
        Ok(batch)
    }

    /// Replace batch-local preferred labels with the store's canonical ones.
    fn canonicalize(&self, mut groups: Vec<ConceptGroup>) -> EnrichResult<Vec<ConceptGroup>> {
        for group in &mut groups {
            let canonical = self.store.upsert(group)?;
            if canonical != group.preflabel {
                debug!(key = %group.key, from = %group.preflabel, to = %canonical, "preflabel override");
                group.preflabel = canonical;
            }
        }
        Ok(groups)
    }
}

fn log_summary(batch: &EnrichmentBatch) {
    info!(
        documents = batch.documents.len(),
        errors = batch.errors.len(),
        concept_groups = batch.concept_groups.len(),
        predicate_groups = batch.predicate_groups.len(),
        dropped_concept_groups = batch.dropped.concept_groups,
        dropped_predicate_groups = batch.dropped.predicate_groups,
        "enrichment batch finished"
    );
}

/// Labels of one document grouped by key, as injected into its payload
fn by_key(labels: &[Label]) -> serde_json::Value {
    let mut grouped: BTreeMap<&str, Vec<&Label>> = BTreeMap::new();
    for label in labels {
        grouped.entry(label.key.as_str()).or_default().push(label);
    }
    serde_json::to_value(grouped).unwrap_or_default()
}

/// Chunk every sentence of one document. Pure apart from the error value.
fn chunk_document(
    chunker: &Chunker,
    config: &EnrichConfig,
    index: usize,
    doc: AnnotatedDocument,
) -> Result<DocumentChunks, DocumentError> {
    let docid = doc.id(&config.id_field).ok_or_else(|| DocumentError {
        index,
        docid: None,
        reason: format!("missing identifier field '{}'", config.id_field),
    })?;

    let mut chunks = DocumentChunks {
        index,
        docid: docid.clone(),
        payload: doc.payload,
        concepts: Vec::new(),
        predicates: Vec::new(),
        short_concepts: 0,
        short_predicates: 0,
    };

    let sentences = doc.sentences.iter().filter(|s| !s.is_empty());
    for (sentenceid, sentence) in sentences.enumerate() {
        let at = SentenceRef::new(docid.clone(), sentenceid);
        let found = chunker.chunk_sentence(sentence, &at);

        for label in found.concepts {
            if label.length >= config.min_concept_length {
                chunks.concepts.push(label);
            } else {
                chunks.short_concepts += 1;
            }
        }
        for label in found.predicates {
            if label.length >= config.min_predicate_length {
                chunks.predicates.push(label);
            } else {
                chunks.short_predicates += 1;
            }
        }
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotatedToken;
    use crate::storage::{MemoryPreflabelStore, StorageError, StorageResult, PreflabelRecord};
    use serde_json::json;

    fn tok(text: &str, tag: &str) -> AnnotatedToken {
        AnnotatedToken::new(text, tag, "dep")
    }

    fn config() -> EnrichConfig {
        EnrichConfig {
            min_concept_length: 1,
            min_predicate_length: 1,
            min_labels: 1,
            ..EnrichConfig::default()
        }
    }

    fn doc(id: &str, sentences: Vec<Vec<AnnotatedToken>>) -> AnnotatedDocument {
        AnnotatedDocument {
            payload: json!({"id": id, "title": "t"}),
            sentences,
        }
    }

    struct UnreachableStore;

    impl PreflabelStore for UnreachableStore {
        fn lookup(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn upsert(&self, _group: &ConceptGroup) -> StorageResult<String> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn record(&self, _key: &str) -> StorageResult<Option<PreflabelRecord>> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn count(&self) -> StorageResult<usize> {
            Err(StorageError::Unavailable("offline".into()))
        }
        fn reset(&self) -> StorageResult<()> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn missing_id_is_reported_and_batch_continues() {
        let enricher = Enricher::new(config(), Arc::new(MemoryPreflabelStore::new()));
        let docs = vec![
            AnnotatedDocument::new(json!({"title": "no id"})).with_sentence(vec![tok("fox", "NN")]),
            doc("2", vec![vec![tok("fox", "NN")]]),
        ];
        let batch = enricher.enrich(docs).unwrap();

        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].index, 0);
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.concept_groups[0].total, 1);
    }

    #[test]
    fn payload_receives_labels_by_key() {
        let enricher = Enricher::new(config(), Arc::new(MemoryPreflabelStore::new()));
        let batch = enricher
            .enrich(vec![doc("a", vec![vec![tok("red", "JJ"), tok("fox", "NN"), tok("run", "VB")]])])
            .unwrap();

        let payload = &batch.documents[0];
        assert_eq!(payload["title"], "t");
        assert_eq!(payload[CONCEPTS_FIELD]["fox_red"][0]["label"], "red fox");
        assert_eq!(payload[PREDICATES_FIELD]["run"][0]["docid"], "a");
    }

    #[test]
    fn short_spans_are_counted_not_grouped() {
        let enricher = Enricher::new(
            EnrichConfig {
                min_concept_length: 2,
                ..config()
            },
            Arc::new(MemoryPreflabelStore::new()),
        );
        let batch = enricher
            .enrich(vec![doc("a", vec![vec![tok("fox", "NN"), tok(",", ","), tok("red", "JJ"), tok("den", "NN")]])])
            .unwrap();

        assert_eq!(batch.dropped.short_concepts, 1);
        assert_eq!(batch.concept_groups.len(), 1);
        assert_eq!(batch.concept_groups[0].key, "den_red");
    }

    #[test]
    fn empty_sentences_do_not_consume_ids() {
        let enricher = Enricher::new(config(), Arc::new(MemoryPreflabelStore::new()));
        let batch = enricher
            .enrich(vec![doc("a", vec![vec![], vec![tok("fox", "NN")]])])
            .unwrap();
        assert_eq!(batch.concept_groups[0].labels[0].sentenceid, 0);
    }

    #[test]
    fn min_labels_applies_across_the_batch() {
        let enricher = Enricher::new(
            EnrichConfig {
                min_labels: 2,
                ..config()
            },
            Arc::new(MemoryPreflabelStore::new()),
        );
        let batch = enricher
            .enrich(vec![
                doc("a", vec![vec![tok("fox", "NN")]]),
                doc("b", vec![vec![tok("fox", "NN")], vec![tok("den", "NN")]]),
            ])
            .unwrap();

        let keys: Vec<_> = batch.concept_groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["fox"]);
        assert_eq!(batch.dropped.concept_groups, 1);
    }

    #[test]
    fn canonical_label_overrides_batch_majority() {
        let store = Arc::new(MemoryPreflabelStore::new());
        let enricher = Enricher::new(config(), store.clone());

        let first = enricher
            .enrich(vec![doc("a", vec![vec![tok("fox", "NN").with_lemma("fox")]])])
            .unwrap();
        assert_eq!(first.concept_groups[0].preflabel, "fox");

        let second = enricher
            .enrich(vec![
                doc("b", vec![vec![tok("foxes", "NNS").with_lemma("fox")]]),
                doc("c", vec![vec![tok("foxes", "NNS").with_lemma("fox")]]),
            ])
            .unwrap();
        assert_eq!(second.concept_groups[0].preflabel, "fox");
        assert_eq!(second.concept_groups[0].alternates.get("foxes"), Some(&2));
        assert_eq!(store.record("fox").unwrap().unwrap().total, 3);
    }

    #[test]
    fn unreachable_store_fails_the_batch() {
        let enricher = Enricher::new(config(), Arc::new(UnreachableStore));
        let result = enricher.enrich(vec![doc("a", vec![vec![tok("fox", "NN")]])]);
        assert!(matches!(result, Err(EnrichError::Storage(StorageError::Unavailable(_)))));
    }

    #[tokio::test]
    async fn concurrent_enrichment_matches_sequential() {
        let docs: Vec<_> = (0..12)
            .map(|i| {
                doc(
                    &i.to_string(),
                    vec![
                        vec![tok("red", "JJ"), tok("fox", "NN"), tok("jump", "VB")],
                        vec![tok("den", "NN"), tok("of", "IN"), tok("fox", "NN")],
                    ],
                )
            })
            .collect();

        let sequential = Enricher::new(config(), Arc::new(MemoryPreflabelStore::new()))
            .enrich(docs.clone())
            .unwrap();
        let concurrent = Enricher::new(config(), Arc::new(MemoryPreflabelStore::new()))
            .enrich_concurrent(docs)
            .await
            .unwrap();

        assert_eq!(sequential.concept_groups, concurrent.concept_groups);
        assert_eq!(sequential.predicate_groups, concurrent.predicate_groups);
        assert_eq!(sequential.documents, concurrent.documents);
    }
}

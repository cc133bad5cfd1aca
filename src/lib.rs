//! spangraph: span-chunking knowledge graph builder
//!
//! Annotated text is chunked into concept and predicate spans, grouped by an
//! order-independent key, given durable canonical labels, and indexed into a
//! search backend where the spans can be queried as a graph.
//!
//! # Core Concepts
//!
//! - **Labels**: concept (noun-phrase-like) and predicate (verb-phrase-like) spans
//! - **Groups**: labels sharing a key, with a preferred surface form
//! - **Preflabels**: canonical labels that stay fixed across batches
//! - **Engines**: Solr or Elasticsearch behind one query interface
//!
//! # Example
//!
//! ```
//! use spangraph::{AnnotatedDocument, AnnotatedToken, EnrichConfig, Enricher, MemoryPreflabelStore};
//! use std::sync::Arc;
//!
//! let doc = AnnotatedDocument::new(serde_json::json!({"id": "1"})).with_sentence(vec![
//!     AnnotatedToken::new("red", "JJ", "amod"),
//!     AnnotatedToken::new("fox", "NN", "nsubj"),
//! ]);
//! let config = EnrichConfig { min_labels: 1, ..Default::default() };
//! let enricher = Enricher::new(config, Arc::new(MemoryPreflabelStore::new()));
//! let batch = enricher.enrich(vec![doc]).unwrap();
//! assert_eq!(batch.concept_groups[0].key, "fox_red");
//! ```

pub mod annotation;
pub mod backend;
pub mod chunk;
pub mod config;
pub mod enrich;
pub mod group;
pub mod mcp;
pub mod payload;
pub mod query;
pub mod storage;

pub use annotation::{AnnotatedDocument, AnnotatedSentence, AnnotatedToken};
pub use backend::{
    connect, AggregateRequest, BackendError, BackendResult, BulkReport, Dictionary, Engine, Filter, GraphDocument,
    IndexSchema, MemoryEngine, RawQuery, Suggestion, TermCount,
};
pub use chunk::{Chunker, ChunkerConfig, ContentType, Label, SentenceRef, TagSet};
pub use config::{default_data_dir, Config, ConfigError, ConfigResult, EngineKind};
pub use enrich::{DocumentError, DropStats, EnrichConfig, EnrichError, EnrichResult, Enricher, EnrichmentBatch};
pub use group::{ConceptGroup, Grouper, Grouping};
pub use query::{
    Exploration, FacetLimits, GraphLeaf, GraphQuery, GraphTree, IndexOutcome, IndexQuery, PredicateBranch,
    QueryRewriter, Summary, DEFAULT_SUGGESTIONS,
};
pub use storage::{
    MemoryPreflabelStore, OpenStore, PreflabelRecord, PreflabelStore, SqlitePreflabelStore, StorageError,
    StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

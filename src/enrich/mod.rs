//! Enrichment pipeline
//!
//! Turns annotated documents into canonicalized concept and predicate groups.

mod pipeline;
mod types;

pub use pipeline::Enricher;
pub use types::{
    DocumentChunks, DocumentError, DropStats, EnrichConfig, EnrichError, EnrichResult, EnrichmentBatch,
    CONCEPTS_FIELD, PREDICATES_FIELD,
};

//! Indexing backends
//!
//! An [`Engine`] hides one search backend behind a single capability set.
//! Solr and Elasticsearch are supported; which one is used is decided once,
//! from [`EngineKind`], when the engine is connected.

mod document;
mod elastic;
mod engine;
mod filter;
mod memory;
#[cfg(test)]
mod scripted;
mod solr;
mod transport;

pub use document::{document_id, fields, graph_documents, GraphDocument};
pub use elastic::{graph_mapping, ElasticEngine};
pub use engine::{
    AggregateRequest, BackendError, BackendResult, BulkRejection, BulkReport, Dictionary, Engine, IndexSchema,
    RawQuery, Suggestion, TermCount,
};
pub(crate) use engine::scalar_text;
pub use filter::Filter;
pub use memory::MemoryEngine;
pub use solr::SolrEngine;
pub use transport::{Body, HttpRequest, HttpResponse, HttpTransport, Method, Transport};

use crate::config::{Config, EngineKind};
use std::sync::Arc;

/// Build the engine for `index` on the configured host.
pub fn connect(config: &Config, index: impl Into<String>) -> BackendResult<Arc<dyn Engine>> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.host.clone(), config.timeout())?);
    Ok(with_transport(config.engine, transport, index))
}

/// Build an engine over an existing transport
pub fn with_transport(kind: EngineKind, transport: Arc<dyn Transport>, index: impl Into<String>) -> Arc<dyn Engine> {
    match kind {
        EngineKind::Solr => Arc::new(SolrEngine::new(transport, index)),
        EngineKind::Elastic => Arc::new(ElasticEngine::new(transport, index)),
    }
}

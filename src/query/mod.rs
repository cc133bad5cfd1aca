//! Query orchestration over the indexing backends
//!
//! [`GraphQuery`] indexes concept/predicate groups and composes engine
//! aggregations into graph queries. [`IndexQuery`] manages the content index.

mod graph;
mod index;
mod types;

pub use graph::{GraphQuery, DEFAULT_SUGGESTIONS};
pub use index::{IndexQuery, QueryRewriter};
pub use types::{Exploration, FacetLimits, GraphLeaf, GraphTree, IndexOutcome, PredicateBranch, Summary};

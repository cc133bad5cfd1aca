//! Grouping of spans into canonical concept groups

mod grouper;

pub use grouper::{ConceptGroup, Grouper, Grouping};

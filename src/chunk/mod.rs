//! Span extraction from annotated sentences
//!
//! Tokens become [`Term`]s, and the [`Chunker`] turns each sentence's terms
//! into concept and predicate [`Label`]s.

mod chunker;
mod derived;
mod label;
mod tags;
mod term;

pub use chunker::{Chunker, ChunkerConfig, SentenceChunks};
pub use derived::{DerivedFormTable, DerivedForms, NoDerivedForms};
pub use label::{make_idiom, make_key, make_label, ContentType, Label, SentenceRef};
pub use tags::{TagClass, TagSet};
pub use term::{Term, TermBuilder};

//! Derived-form lookup for de-adjectival nouns ("sparse" -> "sparsity")

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of derivationally related forms.
///
/// Lexical databases are external; the chunker only needs this lookup.
pub trait DerivedForms: Send + Sync {
    /// The noun derived from an adjective lemma, if one is known.
    fn adjective_to_noun(&self, lemma: &str) -> Option<String>;
}

/// Lookup that never derives anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDerivedForms;

impl DerivedForms for NoDerivedForms {
    fn adjective_to_noun(&self, _lemma: &str) -> Option<String> {
        None
    }
}

/// Table-backed lookup, e.g. exported from a lexical database.
///
/// A derived form is only accepted when it shares its first two characters
/// with the adjective, which filters out loose derivational links
/// ("good" -> "commodity").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedFormTable {
    adjectives: HashMap<String, String>,
}

impl DerivedFormTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adjective(mut self, adjective: impl Into<String>, noun: impl Into<String>) -> Self {
        self.adjectives.insert(adjective.into(), noun.into());
        self
    }

    pub fn len(&self) -> usize {
        self.adjectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjectives.is_empty()
    }
}

fn shares_stem(a: &str, b: &str) -> bool {
    let prefix = |s: &str| s.chars().take(2).collect::<String>();
    prefix(a) == prefix(b)
}

impl DerivedForms for DerivedFormTable {
    fn adjective_to_noun(&self, lemma: &str) -> Option<String> {
        self.adjectives
            .get(lemma)
            .filter(|noun| shares_stem(lemma, noun))
            .cloned()
    }
}

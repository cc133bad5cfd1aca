//! Tag and dependency classification sets

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Coarse class of a token as far as chunking is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagClass {
    /// Open-class noun or adjective
    Concept,
    /// Verb or adverb
    Predicate,
    /// Anything else (determiners, prepositions, numbers, ...)
    Other,
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configurable classification of annotator tags and dependency roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSet {
    /// Nouns and adjectives
    pub concept_tags: HashSet<String>,
    /// Verbs and adverbs
    pub predicate_tags: HashSet<String>,
    /// Tags that get a derived (de-adjectival) noun form
    pub adjective_tags: HashSet<String>,
    /// Normalized forms that count as punctuation
    pub punctuation: HashSet<String>,
    /// Dependencies marking a nominal subject
    pub subject_deps: HashSet<String>,
    /// Dependencies marking a direct object
    pub object_deps: HashSet<String>,
    /// Noise tags dropped before chunking
    pub exclude_tags: HashSet<String>,
    /// Dependencies that may not start or continue a predicate
    pub exclude_deps: HashSet<String>,
}

impl Default for TagSet {
    fn default() -> Self {
        Self {
            concept_tags: set(&["JJ", "JJR", "JJS", "NN", "NNP", "NNS", "ADJ", "NOUN"]),
            predicate_tags: set(&[
                "RB", "RBR", "RBS", "RP", "VB", "VBD", "VBG", "VBN", "VBP", "VBZ", "ADV", "VERB",
            ]),
            adjective_tags: set(&["JJ"]),
            punctuation: set(&[".", ",", "?", "!", ";", ":", "(", ")", "[", "]", "{", "}", "\"", "'"]),
            subject_deps: set(&["nsubj", "nsubjpass"]),
            object_deps: set(&["dobj"]),
            exclude_tags: set(&["SP", "-RRB-", "HYPH"]),
            exclude_deps: HashSet::new(),
        }
    }
}

impl TagSet {
    pub fn classify(&self, tag: &str) -> TagClass {
        if self.concept_tags.contains(tag) {
            TagClass::Concept
        } else if self.predicate_tags.contains(tag) {
            TagClass::Predicate
        } else {
            TagClass::Other
        }
    }

    pub fn is_content(&self, tag: &str) -> bool {
        self.classify(tag) != TagClass::Other
    }

    pub fn is_noise(&self, tag: &str) -> bool {
        self.exclude_tags.contains(tag)
    }

    pub fn is_punctuation(&self, norm: &str) -> bool {
        self.punctuation.contains(norm)
    }

    pub fn is_excluded_dep(&self, dep: &str) -> bool {
        self.exclude_deps.contains(dep)
    }
}

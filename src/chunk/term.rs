//! Term construction from annotated tokens

use super::derived::DerivedForms;
use super::tags::{TagClass, TagSet};
use crate::annotation::AnnotatedToken;
use std::sync::Arc;

/// An annotated token with the context the chunker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Normalized surface form; this is what labels are built from
    pub text: String,
    /// Annotator's normalized form
    pub norm: String,
    /// Lemma for content words, lowercased text otherwise
    pub lemma: String,
    pub tag: String,
    pub class: TagClass,
    pub dep: String,
    pub is_alpha: bool,
    /// De-adjectival noun for adjectives, when one is known
    pub derived: Option<String>,
    /// Lemma of the governing verb when this term is its direct object
    pub object_of: Option<String>,
    /// Lemma of the governing verb when this term is its nominal subject
    pub subject_of: Option<String>,
}

impl Term {
    /// Form contributed to a concept key: the derived noun, else the lemma.
    pub fn concept_form(&self) -> &str {
        self.derived.as_deref().unwrap_or(&self.lemma)
    }

    /// Form contributed to a predicate key.
    pub fn predicate_form(&self) -> &str {
        &self.lemma
    }

    pub fn is_content(&self) -> bool {
        self.class != TagClass::Other
    }
}

/// Converts annotated tokens into terms. Stateless apart from its lookups.
#[derive(Clone)]
pub struct TermBuilder {
    tags: Arc<TagSet>,
    derived: Arc<dyn DerivedForms>,
}

impl std::fmt::Debug for TermBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermBuilder").field("tags", &self.tags).finish_non_exhaustive()
    }
}

impl TermBuilder {
    pub fn new(tags: Arc<TagSet>, derived: Arc<dyn DerivedForms>) -> Self {
        Self { tags, derived }
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Build a term, or `None` for noise tokens.
    pub fn build(&self, token: &AnnotatedToken) -> Option<Term> {
        if self.tags.is_noise(&token.tag) {
            return None;
        }

        let class = self.tags.classify(&token.tag);
        let lemma = match class {
            TagClass::Concept | TagClass::Predicate => token.lemma.clone(),
            TagClass::Other => token.text.to_lowercase(),
        };

        let derived = if self.tags.adjective_tags.contains(&token.tag) {
            self.derived.adjective_to_noun(&lemma)
        } else {
            None
        };

        let governed_by_verb = self.tags.classify(&token.head_tag) == TagClass::Predicate;
        let object_of = (governed_by_verb && self.tags.object_deps.contains(&token.dep))
            .then(|| token.head_lemma.clone());
        let subject_of = (governed_by_verb && self.tags.subject_deps.contains(&token.dep))
            .then(|| token.head_lemma.clone());

        Some(Term {
            text: token.norm.clone(),
            norm: token.norm.clone(),
            lemma,
            tag: token.tag.clone(),
            class,
            dep: token.dep.clone(),
            is_alpha: token.is_alpha,
            derived,
            object_of,
            subject_of,
        })
    }
}

impl Default for TermBuilder {
    fn default() -> Self {
        Self::new(Arc::new(TagSet::default()), Arc::new(super::derived::NoDerivedForms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::derived::DerivedFormTable;

    #[test]
    fn noise_tokens_produce_no_term() {
        let builder = TermBuilder::default();
        assert!(builder.build(&AnnotatedToken::new(" ", "SP", "dep")).is_none());
    }

    #[test]
    fn content_words_use_lemma() {
        let builder = TermBuilder::default();
        let term = builder
            .build(&AnnotatedToken::new("Foxes", "NNS", "nsubj").with_lemma("fox"))
            .unwrap();
        assert_eq!(term.lemma, "fox");
        assert_eq!(term.text, "foxes");
        assert_eq!(term.class, TagClass::Concept);
    }

    #[test]
    fn function_words_use_lowercased_text() {
        let builder = TermBuilder::default();
        let term = builder
            .build(&AnnotatedToken::new("The", "DT", "det").with_lemma("the"))
            .unwrap();
        assert_eq!(term.lemma, "the");
        assert!(!term.is_content());
    }

    #[test]
    fn subject_and_object_of_verb() {
        let builder = TermBuilder::default();
        let subject = builder
            .build(&AnnotatedToken::new("fox", "NN", "nsubj").with_head("VBD", "jump"))
            .unwrap();
        assert_eq!(subject.subject_of.as_deref(), Some("jump"));
        assert_eq!(subject.object_of, None);

        let object = builder
            .build(&AnnotatedToken::new("fence", "NN", "dobj").with_head("VBD", "clear"))
            .unwrap();
        assert_eq!(object.object_of.as_deref(), Some("clear"));
    }

    #[test]
    fn governor_must_be_verb_class() {
        let builder = TermBuilder::default();
        let term = builder
            .build(&AnnotatedToken::new("fox", "NN", "nsubj").with_head("NN", "den"))
            .unwrap();
        assert_eq!(term.subject_of, None);
    }

    #[test]
    fn adjectives_take_derived_form() {
        let builder = TermBuilder::new(
            Arc::new(TagSet::default()),
            Arc::new(DerivedFormTable::new().with_adjective("sparse", "sparsity")),
        );
        let term = builder.build(&AnnotatedToken::new("sparse", "JJ", "amod")).unwrap();
        assert_eq!(term.concept_form(), "sparsity");

        let noun = builder.build(&AnnotatedToken::new("matrix", "NN", "pobj")).unwrap();
        assert_eq!(noun.concept_form(), "matrix");
    }
}

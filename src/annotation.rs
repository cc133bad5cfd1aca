//! Annotated-token boundary types
//!
//! The linguistic annotator is an external collaborator. It hands the crate
//! plain records describing each token; nothing here knows which annotator
//! produced them.

use serde::{Deserialize, Serialize};

/// One token as produced by the external annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    /// Surface text as it appeared in the source
    pub text: String,
    /// Normalized form (usually lowercased surface text)
    pub norm: String,
    /// Lemma
    pub lemma: String,
    /// Fine-grained tag (e.g. `NN`, `VBD`)
    pub tag: String,
    /// Coarse universal part of speech (e.g. `NOUN`), when the annotator supplies it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    /// Dependency role relative to the syntactic head
    pub dep: String,
    /// Tag of the syntactic head
    #[serde(default)]
    pub head_tag: String,
    /// Lemma of the syntactic head
    #[serde(default)]
    pub head_lemma: String,
    /// Whether the token consists only of alphabetic characters
    pub is_alpha: bool,
}

impl AnnotatedToken {
    /// Build a token whose text, norm and lemma coincide.
    ///
    /// Heads default to the token itself (a root) and alphabetic status is
    /// inferred from the text.
    pub fn new(text: impl Into<String>, tag: impl Into<String>, dep: impl Into<String>) -> Self {
        let text = text.into();
        let tag = tag.into();
        let norm = text.to_lowercase();
        Self {
            is_alpha: !text.is_empty() && text.chars().all(char::is_alphabetic),
            lemma: norm.clone(),
            head_tag: tag.clone(),
            head_lemma: norm.clone(),
            norm,
            text,
            tag,
            pos: None,
            dep: dep.into(),
        }
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = lemma.into();
        self
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    /// Attach the syntactic head's tag and lemma
    pub fn with_head(mut self, head_tag: impl Into<String>, head_lemma: impl Into<String>) -> Self {
        self.head_tag = head_tag.into();
        self.head_lemma = head_lemma.into();
        self
    }
}

/// An ordered run of tokens forming one sentence.
pub type AnnotatedSentence = Vec<AnnotatedToken>;

/// A source document: an opaque payload plus its annotated sentences.
///
/// The payload flows through enrichment unchanged apart from the injected
/// aggregate fields. Its identifier lives under a caller-designated field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub payload: serde_json::Value,
    #[serde(default)]
    pub sentences: Vec<AnnotatedSentence>,
}

impl AnnotatedDocument {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            sentences: Vec::new(),
        }
    }

    pub fn with_sentence(mut self, sentence: AnnotatedSentence) -> Self {
        self.sentences.push(sentence);
        self
    }

    /// Read the document identifier from `payload[id_field]`.
    ///
    /// Strings are returned as-is and numbers are rendered; anything else
    /// (including a missing field) yields `None`.
    pub fn id(&self, id_field: &str) -> Option<String> {
        match self.payload.get(id_field)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_token_infers_alphabetic() {
        assert!(AnnotatedToken::new("Fox", "NN", "nsubj").is_alpha);
        assert!(!AnnotatedToken::new("3rd", "JJ", "amod").is_alpha);
        assert!(!AnnotatedToken::new(",", ",", "punct").is_alpha);
    }

    #[test]
    fn new_token_normalizes_case() {
        let tok = AnnotatedToken::new("Fox", "NN", "nsubj");
        assert_eq!(tok.norm, "fox");
        assert_eq!(tok.lemma, "fox");
    }

    #[test]
    fn document_id_accepts_strings_and_numbers() {
        assert_eq!(AnnotatedDocument::new(json!({"id": "post-1"})).id("id").as_deref(), Some("post-1"));
        assert_eq!(AnnotatedDocument::new(json!({"id": 42})).id("id").as_deref(), Some("42"));
        assert_eq!(AnnotatedDocument::new(json!({"slug": "x"})).id("id"), None);
        assert_eq!(AnnotatedDocument::new(json!({"id": ["x"]})).id("id"), None);
    }

    #[test]
    fn document_deserializes_without_sentences() {
        let doc: AnnotatedDocument = serde_json::from_value(json!({"payload": {"id": 1}})).unwrap();
        assert!(doc.sentences.is_empty());
    }
}

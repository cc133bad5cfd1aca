//! Labels: normalized concept and predicate spans

use super::term::Term;
use serde::{Deserialize, Serialize};

/// Whether a span names a concept or a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Concept,
    Predicate,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Predicate => "predicate",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a span was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SentenceRef {
    pub docid: String,
    pub sentenceid: usize,
}

impl SentenceRef {
    pub fn new(docid: impl Into<String>, sentenceid: usize) -> Self {
        Self {
            docid: docid.into(),
            sentenceid,
        }
    }
}

/// A concept or predicate span found in one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Order-independent identifier: sorted, lowercased content forms
    pub key: String,
    /// Order-preserving identifier
    pub idiom: String,
    /// Surface text between the first and last content token
    pub label: String,
    /// Tokens in `[start, end)`, noise included
    pub length: usize,
    /// Sentence token position of the first content token
    pub start: usize,
    /// One past the sentence token position of the last content token
    pub end: usize,
    pub docid: String,
    pub sentenceid: usize,
    #[serde(rename = "objectof", skip_serializing_if = "Option::is_none")]
    pub object_of: Option<String>,
    #[serde(rename = "subjectof", skip_serializing_if = "Option::is_none")]
    pub subject_of: Option<String>,
}

pub fn make_key<S: AsRef<str>>(forms: &[S]) -> String {
    let mut parts: Vec<String> = forms.iter().map(|f| f.as_ref().to_lowercase()).collect();
    parts.sort();
    parts.join("_")
}

pub fn make_idiom<S: AsRef<str>>(forms: &[S]) -> String {
    forms
        .iter()
        .map(|f| f.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn make_label<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| w.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The raw material of one span as accumulated by the chunker.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpanBuffer {
    /// Key forms of the content terms, in order
    pub forms: Vec<String>,
    /// Every term seen while the span was open, slop included
    pub terms: Vec<Term>,
    /// Sentence token position of each entry in `terms`
    pub positions: Vec<usize>,
    /// Non-content terms since the last content term
    pub slop: usize,
}

impl SpanBuffer {
    pub fn push_content(&mut self, form: &str, term: Term, position: usize) {
        self.forms.push(form.to_string());
        self.terms.push(term);
        self.positions.push(position);
        self.slop = 0;
    }

    pub fn push_slop(&mut self, term: Term, position: usize) {
        self.terms.push(term);
        self.positions.push(position);
        self.slop += 1;
    }

    pub fn content_len(&self) -> usize {
        self.forms.len()
    }

    /// Turn the buffer into a label, or `None` if it holds no content term.
    pub fn into_label(self, at: &SentenceRef, is_punctuation: impl Fn(&str) -> bool) -> Option<Label> {
        let first = self.terms.iter().position(Term::is_content)?;
        let last = self.terms.iter().rposition(Term::is_content)?;

        let idioms: Vec<&String> = self.forms.iter().filter(|f| !is_punctuation(f)).collect();
        let words: Vec<&str> = self.terms[first..=last].iter().map(|t| t.text.as_str()).collect();

        let object_of = self.terms.iter().rev().find_map(|t| t.object_of.clone());
        let subject_of = self.terms.iter().rev().find_map(|t| t.subject_of.clone());

        let start = self.positions[first];
        let end = self.positions[last] + 1;
        Some(Label {
            key: make_key(&self.forms),
            idiom: make_idiom(&idioms),
            label: make_label(&words),
            length: end - start,
            start,
            end,
            docid: at.docid.clone(),
            sentenceid: at.sentenceid,
            object_of,
            subject_of,
        })
    }
}
